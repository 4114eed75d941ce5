//! Subcommand implementations
//!
//! Each command writes its human-readable report to the given writer so
//! tests can capture it.

use anyhow::Context;
use kite_api::{CachePolicy, CatalogService, DesignFilter, DesignStorage, PageLimit};
use kite_compose::Composer;
use kite_core::EditorConfig;
use kite_model::{AppliedColors, DesignId, Product, ProductId};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Options for `designs`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum designs to list
    pub limit: usize,
    /// Include unpublished designs
    pub include_private: bool,
    /// Cache behaviour
    pub cache: CachePolicy,
}

/// Compose every variation of `product_path` with `colors_path` into
/// `<out_dir>/<variation>.svg`. Returns the written paths.
///
/// # Errors
/// Fails on unreadable inputs, assignments naming unknown variations,
/// malformed templates or unwritable output.
pub fn compose_files(
    product_path: &Path,
    colors_path: &Path,
    out_dir: &Path,
    config: &EditorConfig,
    out: &mut dyn Write,
) -> anyhow::Result<Vec<PathBuf>> {
    let product: Product = read_json(product_path)?;
    let applied: AppliedColors = read_json(colors_path)?;
    applied.validate_against(&product)?;

    let composed = Composer::with_options(config.compose.clone()).compose_all(&product, &applied)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let mut written = Vec::with_capacity(composed.len());
    for variation in composed {
        let path = out_dir.join(format!("{}.svg", file_stem(&variation.name)));
        std::fs::write(&path, &variation.svg_markup)
            .with_context(|| format!("writing {}", path.display()))?;
        let marker = if variation.is_primary { " (primary)" } else { "" };
        writeln!(out, "{}{} -> {}", variation.name, marker, path.display())?;
        written.push(path);
    }
    tracing::info!(product = %product.id, files = written.len(), "composition written");
    Ok(written)
}

/// Print a product summary
///
/// # Errors
/// Fails if the product cannot be fetched.
pub async fn show_product(
    catalog: &dyn CatalogService,
    id: &ProductId,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let product = catalog
        .fetch_product(id)
        .await
        .with_context(|| format!("fetching product {id}"))?;

    writeln!(out, "{} ({})", product.name, product.id)?;
    if let Some(manufacturer) = &product.manufacturer {
        match catalog.fetch_manufacturer(manufacturer).await {
            Ok(m) => writeln!(out, "  manufacturer: {}", m.name)?,
            Err(err) => {
                tracing::warn!(%manufacturer, error = %err, "manufacturer lookup failed");
                writeln!(out, "  manufacturer: {manufacturer}")?;
            }
        }
    }
    writeln!(out, "  colors:")?;
    for color in &product.colors {
        writeln!(out, "    {:<16} {}", color.name, color.hex)?;
    }
    writeln!(out, "  variations:")?;
    for variation in &product.variations {
        writeln!(out, "    {}", variation.name)?;
    }
    Ok(())
}

/// Print one page of designs
///
/// # Errors
/// Fails if the listing cannot be fetched.
pub async fn list_designs(
    storage: &dyn DesignStorage,
    options: ListOptions,
    out: &mut dyn Write,
) -> anyhow::Result<usize> {
    let mut filter = DesignFilter::new().with_limit(PageLimit::first(options.limit));
    if options.include_private {
        filter = filter.including_private();
    }
    let designs = storage
        .list_designs(&filter, options.cache)
        .await
        .context("listing designs")?;

    for design in &designs {
        let created = design.created.as_deref().unwrap_or("-");
        let primary = design
            .primary_variation()
            .map_or("-", |v| v.name.as_str());
        writeln!(
            out,
            "{:>8}  {:<32}  {:<20}  {}",
            design.id.as_str(),
            design.name,
            created,
            primary
        )?;
    }
    Ok(designs.len())
}

/// Delete a design
///
/// # Errors
/// Fails if the backend rejects the deletion.
pub async fn delete_design(
    storage: &dyn DesignStorage,
    id: &DesignId,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    storage
        .delete_design(id)
        .await
        .with_context(|| format!("deleting design {id}"))?;
    writeln!(out, "deleted design {id}")?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Variation names become file names; anything outside `[A-Za-z0-9_-]` is
/// replaced by `-`.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .collect();
    if stem.is_empty() {
        "variation".to_string()
    } else {
        stem
    }
}
