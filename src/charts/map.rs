//! Leaflet Map Module
//! Builds a standalone HTML page with an interactive Leaflet map.
//!
//! Layout:
//! 1. Full-window map with a tile layer
//! 2. Circle markers with popups (optionally clustered)
//! 3. Optional heat layer, fullscreen and scale controls
//! 4. Optional fixed legend box, bottom left

use super::RenderError;
use crate::geo::Coordinate;
use serde::Serialize;
use std::fs;
use std::path::Path;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const CLUSTER_CSS: [&str; 2] = [
    "https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css",
    "https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css",
];
const CLUSTER_JS: &str = "https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js";
const FULLSCREEN_CSS: &str = "https://unpkg.com/leaflet.fullscreen@3.0.2/Control.FullScreen.css";
const FULLSCREEN_JS: &str = "https://unpkg.com/leaflet.fullscreen@3.0.2/Control.FullScreen.js";
const HEAT_JS: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize to JSON that is safe inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Base map tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileLayer {
    #[default]
    OpenStreetMap,
    CartoDbPositron,
}

impl TileLayer {
    fn url(self) -> &'static str {
        match self {
            TileLayer::OpenStreetMap => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            TileLayer::CartoDbPositron => {
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
            }
        }
    }

    fn attribution(self) -> &'static str {
        match self {
            TileLayer::OpenStreetMap => {
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
            }
            TileLayer::CartoDbPositron => {
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>"
            }
        }
    }
}

/// One circle marker. `popup` is HTML and must already be escaped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub radius: u32,
    pub colour: String,
    pub popup: String,
}

/// A coloured swatch with an optional caption.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub colour: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, colour: &str, label: &str) -> Self {
        self.entries.push(LegendEntry {
            colour: colour.to_string(),
            label: label.to_string(),
        });
        self
    }

    fn to_html(&self) -> String {
        let mut html = String::from(
            "<div class=\"map-legend\" style=\"position: fixed; bottom: 50px; left: 50px; \
             min-width: 150px; padding: 4px 8px; border: 2px solid grey; \
             background-color: white; z-index: 9999; font-size: 14px;\">\n",
        );
        html.push_str(&format!("<b>{}</b><br>\n", escape_html(&self.title)));
        for entry in &self.entries {
            html.push_str(&format!(
                "<i style=\"background:{};\">&nbsp;&nbsp;&nbsp;&nbsp;</i>&nbsp;{}<br>\n",
                escape_html(&entry.colour),
                escape_html(&entry.label)
            ));
        }
        html.push_str("</div>\n");
        html
    }
}

/// An interactive map rendered to a single HTML file.
#[derive(Debug, Clone)]
pub struct LeafletMap {
    title: String,
    centre: Coordinate,
    zoom: u8,
    tiles: TileLayer,
    markers: Vec<MapMarker>,
    legend: Option<Legend>,
    cluster: bool,
    fullscreen: bool,
    scale_control: bool,
    heat_points: Vec<Coordinate>,
}

impl LeafletMap {
    pub fn new(title: &str, centre: Coordinate, zoom: u8) -> Self {
        Self {
            title: title.to_string(),
            centre,
            zoom,
            tiles: TileLayer::default(),
            markers: Vec::new(),
            legend: None,
            cluster: false,
            fullscreen: false,
            scale_control: false,
            heat_points: Vec::new(),
        }
    }

    pub fn with_tiles(mut self, tiles: TileLayer) -> Self {
        self.tiles = tiles;
        self
    }

    pub fn with_clustering(mut self, cluster: bool) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_scale_control(mut self, scale_control: bool) -> Self {
        self.scale_control = scale_control;
        self
    }

    pub fn add_marker(&mut self, marker: MapMarker) {
        self.markers.push(marker);
    }

    pub fn set_legend(&mut self, legend: Legend) {
        self.legend = Some(legend);
    }

    pub fn set_heat_points(&mut self, points: Vec<Coordinate>) {
        self.heat_points = points;
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    /// Render the complete HTML document.
    pub fn to_html(&self) -> Result<String, RenderError> {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));

        html.push_str(&format!("<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">\n"));
        if self.cluster {
            for css in CLUSTER_CSS {
                html.push_str(&format!("<link rel=\"stylesheet\" href=\"{css}\">\n"));
            }
        }
        if self.fullscreen {
            html.push_str(&format!("<link rel=\"stylesheet\" href=\"{FULLSCREEN_CSS}\">\n"));
        }
        html.push_str(&format!("<script src=\"{LEAFLET_JS}\"></script>\n"));
        if self.cluster {
            html.push_str(&format!("<script src=\"{CLUSTER_JS}\"></script>\n"));
        }
        if self.fullscreen {
            html.push_str(&format!("<script src=\"{FULLSCREEN_JS}\"></script>\n"));
        }
        if !self.heat_points.is_empty() {
            html.push_str(&format!("<script src=\"{HEAT_JS}\"></script>\n"));
        }
        html.push_str(
            "<style>html, body { width: 100%; height: 100%; margin: 0; padding: 0; } \
             #map { position: absolute; top: 0; bottom: 0; left: 0; right: 0; }</style>\n",
        );
        html.push_str("</head>\n<body>\n<div id=\"map\"></div>\n");

        if let Some(legend) = &self.legend {
            html.push_str(&legend.to_html());
        }

        html.push_str("<script>\n");
        html.push_str(&format!(
            "var map = L.map('map', {{ center: [{}, {}], zoom: {} }});\n",
            self.centre.lat, self.centre.lon, self.zoom
        ));
        html.push_str(&format!(
            "L.tileLayer({}, {{ attribution: {}, maxZoom: 19 }}).addTo(map);\n",
            script_json(self.tiles.url())?,
            script_json(self.tiles.attribution())?
        ));
        if self.scale_control {
            html.push_str("L.control.scale().addTo(map);\n");
        }
        if self.fullscreen {
            html.push_str("L.control.fullscreen().addTo(map);\n");
        }

        html.push_str(&format!("var markers = {};\n", script_json(&self.markers)?));
        if self.cluster {
            html.push_str("var layer = L.markerClusterGroup();\n");
        } else {
            html.push_str("var layer = L.featureGroup();\n");
        }
        html.push_str(
            "markers.forEach(function (m) {\n  \
             L.circleMarker([m.lat, m.lon], { radius: m.radius, color: m.colour, fill: true, \
             fillColor: m.colour, fillOpacity: 0.6 })\n    \
             .bindPopup(m.popup, { maxWidth: 250 })\n    .addTo(layer);\n});\n\
             layer.addTo(map);\n",
        );

        if !self.heat_points.is_empty() {
            let points: Vec<[f64; 2]> = self.heat_points.iter().map(|c| [c.lat, c.lon]).collect();
            html.push_str(&format!(
                "L.heatLayer({}, {{ radius: 15 }}).addTo(map);\n",
                script_json(&points)?
            ));
        }

        html.push_str("</script>\n</body>\n</html>\n");
        Ok(html)
    }

    /// Write the map to `path`.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        fs::write(path, self.to_html()?)?;
        Ok(())
    }
}
