//! KML 2.2 document assembly.

use std::fmt::Write as _;

use crate::geodesy::GeographicPoint;

/// Style used for features whose layer has no style of its own.
pub const DEFAULT_STYLE_ID: &str = "layer_default";

/// Color of the default style (opaque red).
pub const DEFAULT_STYLE_COLOR: &str = "ff0000ff";

const LINE_WIDTH: u32 = 2;

/// Style identifier for a layer: `layer_` plus the name with spaces and path
/// separators replaced by underscores.
pub fn style_id(layer: &str) -> String {
    let sanitized: String = layer
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("layer_{}", sanitized)
}

/// Escape text for use in XML element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Incrementally built KML document.
///
/// Styles and placemarks are buffered separately so styles can be emitted
/// first regardless of the order features are added in.
#[derive(Debug)]
pub struct KmlDocument {
    name: String,
    styles: Vec<(String, &'static str)>,
    placemarks: String,
    placemark_count: usize,
}

impl KmlDocument {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            styles: Vec::new(),
            placemarks: String::new(),
            placemark_count: 0,
        }
    }

    /// Add a line style. Ignored if a style with the same id already exists.
    pub fn add_style(&mut self, id: String, color: &'static str) {
        if !self.styles.iter().any(|(existing, _)| *existing == id) {
            self.styles.push((id, color));
        }
    }

    /// Append a `LineString` placemark.
    pub fn add_placemark(&mut self, name: &str, style: &str, path: &[GeographicPoint]) {
        let coordinates = path
            .iter()
            .map(|p| format!("{:.7},{:.7},0", p.longitude, p.latitude))
            .collect::<Vec<_>>()
            .join(" ");

        // Writing to a String cannot fail
        let _ = writeln!(
            self.placemarks,
            "  <Placemark><name>{}</name><styleUrl>#{}</styleUrl><LineString><tessellate>1</tessellate><coordinates>{}</coordinates></LineString></Placemark>",
            escape(name),
            escape(style),
            coordinates
        );
        self.placemark_count += 1;
    }

    pub fn placemark_count(&self) -> usize {
        self.placemark_count
    }

    /// Serialize: layer styles, the default style, then placemarks.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.placemarks.len() + 512);
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
        out.push_str("<Document>\n");
        let _ = writeln!(out, "  <name>{}</name>", escape(&self.name));
        for (id, color) in &self.styles {
            push_style(&mut out, id, color);
        }
        push_style(&mut out, DEFAULT_STYLE_ID, DEFAULT_STYLE_COLOR);
        out.push_str(&self.placemarks);
        out.push_str("</Document>\n</kml>\n");
        out
    }
}

fn push_style(out: &mut String, id: &str, color: &str) {
    let _ = writeln!(
        out,
        "  <Style id=\"{}\"><LineStyle><color>{}</color><width>{}</width></LineStyle></Style>",
        escape(id),
        color,
        LINE_WIDTH
    );
}
