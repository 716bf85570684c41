//! Layer registry built from a drawing scan.

use std::collections::HashMap;

use super::palette::{self, PaletteColor, PALETTE_SIZE};
use crate::drawing::GeometryKind;

/// A named layer discovered in a drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    /// Whether entities on this layer are converted
    pub enabled: bool,
    /// Index into the palette, `0..PALETTE_SIZE`
    pub color_index: usize,
    feature_count: usize,
}

impl Layer {
    fn new(name: &str, color_index: usize) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            color_index,
            feature_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entities seen on this layer during the scan.
    ///
    /// Counts every recognized entity, including ones the pipeline later
    /// fails to extract.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn color(&self) -> &'static PaletteColor {
        palette::color(self.color_index)
    }
}

/// Layers of one drawing, in discovery order.
///
/// Built fresh for every scanned drawing; nothing carries over between
/// drawings.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    index: HashMap<String, usize>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(layer, kind)` pairs in source order.
    ///
    /// A layer gets `color_index = discovery position % PALETTE_SIZE`, so
    /// the same entity order always yields the same colors.
    pub fn scan<'a, I>(sightings: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, GeometryKind)>,
    {
        let mut registry = Self::new();
        for (name, _kind) in sightings {
            registry.record(name);
        }
        tracing::debug!(layers = registry.len(), "Layer scan complete");
        registry
    }

    fn record(&mut self, name: &str) {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => {
                let slot = self.layers.len();
                self.layers.push(Layer::new(name, slot % PALETTE_SIZE));
                self.index.insert(name.to_string(), slot);
                slot
            }
        };
        self.layers[slot].feature_count += 1;
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&slot| &self.layers[slot])
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.index.get(name).map(|&slot| &mut self.layers[slot])
    }

    /// Flip a layer's enabled flag. Returns the new state, or `None` if the
    /// layer is unknown.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let layer = self.get_mut(name)?;
        layer.enabled = !layer.enabled;
        Some(layer.enabled)
    }

    /// Set a layer's enabled flag. Returns false if the layer is unknown.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.get_mut(name) {
            Some(layer) => {
                layer.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self) {
        self.layers.iter_mut().for_each(|l| l.enabled = true);
    }

    pub fn deselect_all(&mut self) {
        self.layers.iter_mut().for_each(|l| l.enabled = false);
    }

    /// Advance a layer to the next palette color. Returns the new index.
    pub fn cycle_color(&mut self, name: &str) -> Option<usize> {
        let layer = self.get_mut(name)?;
        layer.color_index = (layer.color_index + 1) % PALETTE_SIZE;
        Some(layer.color_index)
    }

    /// Assign a specific palette index. Returns false if the layer is unknown.
    pub fn set_color(&mut self, name: &str, color_index: usize) -> bool {
        match self.get_mut(name) {
            Some(layer) => {
                layer.color_index = color_index % PALETTE_SIZE;
                true
            }
            None => false,
        }
    }

    /// Layers in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.layers.iter().filter(|l| l.enabled).count()
    }
}
