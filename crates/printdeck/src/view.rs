//! What the card shows, decided from the configuration and the current
//! status. The same view is served as JSON and rendered as text for the CLI.

use std::fmt;

use serde::Serialize;

use crate::actions::Control;
use crate::card::Card;
use crate::engine::format_duration;
use crate::engine::format_num;
use crate::engine::or_zero;
use crate::engine::FieldValue;
use crate::engine::PrinterImage;
use crate::engine::StatusSnapshot;
use crate::engine::MISSING;

pub const NO_PRINTER: &str = "No printer found. Check your entities or filter prefix.";

const CELSIUS: &str = "\u{b0}C";

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub header: Option<Header>,
    /// `None` when no printer is selected.
    pub printer: Option<PrinterView>,
    pub card_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub title: String,
    pub online: bool,
    pub state: Option<String>,
    /// Selector entries, only when there is more than one printer.
    pub printers: Vec<PrinterOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrinterOption {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrinterView {
    pub key: String,
    pub stage: Option<Stage>,
    pub progress: Option<ProgressStrip>,
    pub controls: Option<Vec<SwitchView>>,
    pub temperatures: Option<Vec<TemperatureView>>,
    pub actions: Option<Vec<ActionButton>>,
    pub status: Option<StatusPanel>,
    /// Left and right panels side by side.
    pub two_column: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    pub printer_image: String,
    pub file_preview: Option<String>,
    pub webcam: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressStrip {
    /// Bar fill, 0 to 100.
    pub fill: f64,
    pub progress: String,
    pub layer: String,
    pub total_layers: String,
    pub elapsed: String,
    pub remaining: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchView {
    pub control: String,
    pub label: &'static str,
    pub entity_id: String,
    pub on: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureView {
    pub label: &'static str,
    pub value: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionButton {
    pub action: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPanel {
    pub compact: bool,
    pub rows: Vec<StatusRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub label: &'static str,
    pub value: String,
}

impl CardView {
    pub fn build(card: &Card) -> Self {
        let cfg = card.config();
        let status = card.status();
        let selected = card.selection().key();

        let header = cfg.show_header.then(|| {
            let printers = if card.printers().len() > 1 {
                card.printers()
                    .iter()
                    .map(|p| PrinterOption {
                        key: p.key.clone(),
                        label: p.label.clone(),
                        selected: Some(p.key.as_str()) == selected,
                    })
                    .collect()
            } else {
                Vec::new()
            };
            Header {
                title: cfg.title.clone(),
                online: status.is_some_and(|d| d.online == Some(true)),
                state: status
                    .and_then(|d| d.state_text.as_ref())
                    .filter(|v| v.is_truthy())
                    .map(ToString::to_string),
                printers,
            }
        });

        let printer = match (selected, status) {
            (Some(key), Some(d)) => Some(PrinterView::build(card, key, d)),
            _ => None,
        };

        Self {
            header,
            printer,
            card_size: cfg.card_size(),
        }
    }
}

impl PrinterView {
    fn build(card: &Card, key: &str, d: &StatusSnapshot) -> Self {
        let cfg = card.config();

        let stage = cfg.show_stage.then(|| Stage {
            printer_image: format!(
                "{}{}",
                cfg.images_path,
                PrinterImage::guess(Some(&d.model), key)
            ),
            file_preview: d
                .current_file_image
                .clone()
                .filter(|_| cfg.show_file_preview),
            webcam: d.webcam_url.clone().filter(|_| cfg.show_webcam),
        });

        let progress = cfg.show_progress.then(|| ProgressStrip {
            fill: d
                .progress
                .as_ref()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
                .clamp(0.0, 100.0),
            progress: or_zero(d.progress.as_ref()),
            layer: or_zero(d.layer.as_ref()),
            total_layers: or_zero(d.total_layers.as_ref()),
            elapsed: format_duration(d.elapsed_sec.as_ref()),
            remaining: format_duration(d.remaining_sec.as_ref()),
        });

        let controls = cfg.show_controls.then(|| {
            Control::all()
                .map(|control| {
                    let entity_id = control.entity_id(key);
                    SwitchView {
                        control: control.to_string(),
                        label: control.label(),
                        on: card.states().get(&entity_id).is_some_and(|st| st.is_on()),
                        entity_id,
                    }
                })
                .collect()
        });

        let temperatures = cfg.show_temperatures.then(|| {
            let target = |v: Option<&FieldValue>| format!("Target: {}", format_num(v, CELSIUS));
            vec![
                TemperatureView {
                    label: "Bed",
                    value: format_num(d.bed_temp.as_ref(), CELSIUS),
                    detail: target(d.bed_target.as_ref()),
                },
                TemperatureView {
                    label: "Chamber",
                    value: format_num(d.chamber_temp.as_ref(), CELSIUS),
                    detail: "Ambient".to_string(),
                },
                TemperatureView {
                    label: "Nozzle",
                    value: format_num(d.nozzle_temp.as_ref(), CELSIUS),
                    detail: target(d.nozzle_target.as_ref()),
                },
            ]
        });

        let actions = cfg.show_actions.then(|| {
            let pause = if d.is_printing() {
                ActionButton {
                    action: "pause",
                    label: "Pause",
                }
            } else {
                ActionButton {
                    action: "unpause",
                    label: "Resume",
                }
            };
            vec![
                ActionButton {
                    action: "auto_home",
                    label: "Auto Home",
                },
                pause,
                ActionButton {
                    action: "stop",
                    label: "Stop",
                },
            ]
        });

        let status = cfg.show_status.then(|| StatusPanel {
            compact: cfg.compact_status,
            rows: status_rows(d),
        });

        Self {
            key: key.to_string(),
            stage,
            progress,
            controls,
            temperatures,
            actions,
            status,
            two_column: cfg.has_left_panel() && cfg.show_status,
        }
    }
}

fn status_rows(d: &StatusSnapshot) -> Vec<StatusRow> {
    let text = |v: Option<&FieldValue>| {
        v.map_or_else(|| MISSING.to_string(), ToString::to_string)
    };
    let online = if d.online == Some(true) {
        "Online"
    } else {
        "Offline"
    };

    [
        ("File", text(d.file.as_ref())),
        ("Online", online.to_string()),
        ("State", text(d.state_text.as_ref())),
        ("Code", text(d.state_code.as_ref())),
        ("Progress", format!("{}%", or_zero(d.progress.as_ref()))),
        (
            "Layer",
            format!(
                "{} / {}",
                or_zero(d.layer.as_ref()),
                or_zero(d.total_layers.as_ref())
            ),
        ),
        ("Elapsed", format_duration(d.elapsed_sec.as_ref())),
        ("Remaining", format_duration(d.remaining_sec.as_ref())),
    ]
    .into_iter()
    .map(|(label, value)| StatusRow { label, value })
    .collect()
}

impl fmt::Display for CardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();

        if let Some(header) = &self.header {
            let chip = if header.online { "Online" } else { "Offline" };
            let mut line = format!("{} [{}]", header.title, chip);
            if let Some(state) = &header.state {
                line.push_str(&format!(" [{state}]"));
            }
            lines.push(line);

            if !header.printers.is_empty() {
                let options: Vec<String> = header
                    .printers
                    .iter()
                    .map(|p| {
                        if p.selected {
                            format!("[{}]", p.label)
                        } else {
                            p.label.clone()
                        }
                    })
                    .collect();
                lines.push(format!("Printers: {}", options.join(", ")));
            }
        }

        match &self.printer {
            None => lines.push(NO_PRINTER.to_string()),
            Some(p) => p.render(&mut lines),
        }

        f.write_str(&lines.join("\n"))
    }
}

impl PrinterView {
    fn render(&self, lines: &mut Vec<String>) {
        if let Some(stage) = &self.stage {
            lines.push(format!("Image: {}", stage.printer_image));
            if let Some(preview) = &stage.file_preview {
                lines.push(format!("Preview: {preview}"));
            }
            if let Some(webcam) = &stage.webcam {
                lines.push(format!("Webcam: {webcam}"));
            }
        }

        if let Some(p) = &self.progress {
            lines.push(format!(
                "Progress: {}% | Layer {}/{} | Elapsed {} | Remaining {}",
                p.progress, p.layer, p.total_layers, p.elapsed, p.remaining
            ));
        }

        if let Some(controls) = &self.controls {
            let switches: Vec<String> = controls
                .iter()
                .map(|s| format!("{} {}", s.label, if s.on { "on" } else { "off" }))
                .collect();
            lines.push(format!("Controls: {}", switches.join(", ")));
        }

        if let Some(temps) = &self.temperatures {
            let temps: Vec<String> = temps
                .iter()
                .map(|t| format!("{} {} ({})", t.label, t.value, t.detail))
                .collect();
            lines.push(format!("Temperatures: {}", temps.join(", ")));
        }

        if let Some(actions) = &self.actions {
            let labels: Vec<&str> = actions.iter().map(|a| a.label).collect();
            lines.push(format!("Actions: {}", labels.join(", ")));
        }

        if let Some(status) = &self.status {
            lines.push("Status:".to_string());
            for row in &status.rows {
                if status.compact {
                    lines.push(format!("  {}: {}", row.label, row.value));
                } else {
                    lines.push(format!("  {:<10} {}", row.label, row.value));
                }
            }
        }
    }
}
