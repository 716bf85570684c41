//! Layer selection shared by `layers` and `convert`.

use std::path::Path;

use clap::Args;
use console::style;
use surveykml::drawing::Drawing;
use surveykml::layer::{LayerRegistry, PaletteColor, PALETTE};

use crate::error::CliError;

/// Layer selection flags.
#[derive(Debug, Clone, Default, Args)]
pub struct LayerSelection {
    /// Convert only these layers (repeatable)
    #[arg(long = "only", value_name = "LAYER")]
    pub only: Vec<String>,

    /// Leave these layers out (repeatable)
    #[arg(long = "exclude", value_name = "LAYER")]
    pub exclude: Vec<String>,

    /// Override a layer color, e.g. --color Roads=Orange (repeatable)
    #[arg(long = "color", value_name = "LAYER=COLOR")]
    pub colors: Vec<String>,
}

impl LayerSelection {
    /// Apply the flags to a freshly scanned registry.
    pub fn apply(&self, registry: &mut LayerRegistry) -> Result<(), CliError> {
        if !self.only.is_empty() {
            registry.deselect_all();
            for name in &self.only {
                require_layer(registry, name)?;
                registry.set_enabled(name, true);
            }
        }
        for name in &self.exclude {
            require_layer(registry, name)?;
            registry.set_enabled(name, false);
        }
        for entry in &self.colors {
            let (name, color) = parse_color_entry(entry)?;
            require_layer(registry, name)?;
            registry.set_color(name, color);
        }
        Ok(())
    }
}

fn require_layer(registry: &LayerRegistry, name: &str) -> Result<(), CliError> {
    if registry.get(name).is_some() {
        return Ok(());
    }
    let known: Vec<&str> = registry.iter().map(|l| l.name()).collect();
    Err(CliError::Input(format!(
        "Unknown layer '{}'. Layers in this drawing: {}",
        name,
        known.join(", ")
    )))
}

/// Parse `LAYER=COLOR` into the layer name and palette index.
pub fn parse_color_entry(entry: &str) -> Result<(&str, usize), CliError> {
    let (name, color) = entry
        .rsplit_once('=')
        .ok_or_else(|| CliError::Input(format!("Expected LAYER=COLOR, got '{}'", entry)))?;
    let (index, _) = PaletteColor::by_name(color.trim()).ok_or_else(|| {
        let names: Vec<&str> = PALETTE.iter().map(|c| c.name).collect();
        CliError::Input(format!(
            "Unknown color '{}'. Available: {}",
            color,
            names.join(", ")
        ))
    })?;
    Ok((name, index))
}

/// Open a drawing and scan its layers.
pub fn scan(path: &Path) -> Result<(Drawing, LayerRegistry), CliError> {
    let drawing = Drawing::open(path)?;
    let registry = LayerRegistry::scan(drawing.layer_sightings());
    Ok((drawing, registry))
}

/// `#RRGGBB` for a palette color.
pub fn hex(color: &PaletteColor) -> String {
    let (r, g, b) = color.rgb();
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Print the registry as a table.
pub fn print_layers(registry: &LayerRegistry) {
    println!(
        "{}",
        style(format!(
            "  {:<3} {:<28} {:>8}  {:<8} {}",
            "", "Layer", "Entities", "Color", ""
        ))
        .bold()
    );
    for layer in registry.iter() {
        let mark = if layer.enabled { "[x]" } else { "[ ]" };
        let color = layer.color();
        println!(
            "  {:<3} {:<28} {:>8}  {:<8} {}",
            mark,
            layer.name(),
            layer.feature_count(),
            color.name,
            style(hex(color)).dim()
        );
    }
    println!();
    println!(
        "  {} of {} layers selected",
        registry.enabled_count(),
        registry.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveykml::drawing::GeometryKind;

    fn registry() -> LayerRegistry {
        LayerRegistry::scan([
            ("Lots", GeometryKind::OpenPolyline),
            ("Roads", GeometryKind::Line),
            ("Notes", GeometryKind::OpenPolyline),
        ])
    }

    #[test]
    fn test_only_selects_listed_layers() {
        let mut registry = registry();
        let selection = LayerSelection {
            only: vec!["Roads".to_string()],
            ..Default::default()
        };
        selection.apply(&mut registry).unwrap();

        assert!(!registry.get("Lots").unwrap().enabled);
        assert!(registry.get("Roads").unwrap().enabled);
        assert_eq!(registry.enabled_count(), 1);
    }

    #[test]
    fn test_exclude_and_color() {
        let mut registry = registry();
        let selection = LayerSelection {
            exclude: vec!["Notes".to_string()],
            colors: vec!["Roads=orange".to_string()],
            ..Default::default()
        };
        selection.apply(&mut registry).unwrap();

        assert!(!registry.get("Notes").unwrap().enabled);
        assert_eq!(registry.get("Roads").unwrap().color().name, "Orange");
    }

    #[test]
    fn test_unknown_layer_rejected() {
        let mut registry = registry();
        let selection = LayerSelection {
            exclude: vec!["Contours".to_string()],
            ..Default::default()
        };
        let err = selection.apply(&mut registry).unwrap_err();
        assert!(err.to_string().contains("Contours"));
    }

    #[test]
    fn test_color_entry_parsing() {
        assert_eq!(parse_color_entry("Boundary Wall=Red").unwrap(), ("Boundary Wall", 0));
        assert!(parse_color_entry("Roads").is_err());
        assert!(parse_color_entry("Roads=Mauve").is_err());
    }

    #[test]
    fn test_hex_swatch() {
        assert_eq!(hex(&PALETTE[6]), "#FF6600");
    }
}
