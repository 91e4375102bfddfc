//! Metadata that lets a form designer list and instantiate the keyboard widget.

use crate::error::{Error, Result};
use crate::widget::HeatKeyboard;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct WidgetDescriptor {
    pub name: &'static str,
    pub group: &'static str,
    pub include: &'static str,
    pub tool_tip: &'static str,
    pub whats_this: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub container: bool,
    pub initialized: bool,
    pub geometry: Geometry,
}

impl Default for WidgetDescriptor {
    fn default() -> Self {
        Self {
            name: "HeatKeyboard",
            group: "Custom Widgets",
            include: "heatboard::widget::HeatKeyboard",
            tool_tip: "Full keyboard widget with heat map statistics",
            whats_this:
                "Visual keyboard that reacts to physical keystrokes and exposes heat map statistics.",
            icon: None,
            container: false,
            initialized: false,
            geometry: Geometry { x: 0, y: 0, width: 800, height: 300 },
        }
    }
}

impl WidgetDescriptor {
    /// Called once by the host; later calls do nothing
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
    }

    /// Form snippet the designer inserts when the widget is dropped
    pub fn dom_xml(&self) -> String {
        let g = self.geometry;
        format!(
            concat!(
                "<widget class=\"{class}\" name=\"{instance}\">\n",
                "  <property name=\"geometry\">\n",
                "    <rect>\n",
                "      <x>{x}</x>\n",
                "      <y>{y}</y>\n",
                "      <width>{width}</width>\n",
                "      <height>{height}</height>\n",
                "    </rect>\n",
                "  </property>\n",
                "</widget>\n",
            ),
            class = self.name,
            instance = instance_name(self.name),
            x = g.x,
            y = g.y,
            width = g.width,
            height = g.height,
        )
    }

    pub fn create_widget(&self) -> HeatKeyboard {
        HeatKeyboard::new()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Serialize(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialize(e.to_string()))
    }
}

/// `HeatKeyboard` -> `heatKeyboard`
fn instance_name(class: &str) -> String {
    let mut chars = class.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
