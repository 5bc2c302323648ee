//! egui rendering of widget trees
//!
//! Rendering is immediate mode: every frame walks the layout tree and draws
//! the current state of each control. User edits are written back through
//! [`Widget::set_value`] or [`Widget::click`], so the normal watcher chain
//! carries them to the bound parameters.

use egui::{Color32, ComboBox, DragValue, RichText, Slider, Ui};

use crate::constants::toggle;
use crate::param::Value;
use crate::widgets::{Layout, LayoutKind, Viewable, Widget, WidgetKind};

/// Draw any viewable node
pub fn render_viewable(ui: &mut Ui, item: &Viewable) {
    match item {
        Viewable::Widget(widget) => render_widget(ui, widget),
        Viewable::Layout(layout) => render_layout(ui, layout),
        Viewable::Panel(panel) => render_layout(ui, &panel.layout()),
        Viewable::Pane(pane) => render_output(ui, &pane.object()),
        Viewable::Reactive(reactive) => render_layout(ui, &reactive.layout()),
    }
}

fn render_output(ui: &mut Ui, output: &crate::reactive::Output) {
    use crate::reactive::Output;
    match output {
        Output::Text(text) => render_markup(ui, text),
        Output::Value(value) => {
            ui.label(value.to_string());
        }
        Output::Widget(widget) => render_widget(ui, widget),
        Output::Layout(layout) => render_layout(ui, layout),
        Output::Panel(panel) => render_layout(ui, &panel.layout()),
    }
}

/// Draw a layout and its children
pub fn render_layout(ui: &mut Ui, layout: &Layout) {
    // Snapshot the children; edits may rebuild the layout mid-frame
    let children = layout.objects();
    match layout.kind() {
        LayoutKind::Row => {
            ui.horizontal(|ui| {
                for child in &children {
                    render_viewable(ui, child);
                }
            });
        }
        LayoutKind::Column | LayoutKind::WidgetBox => {
            ui.vertical(|ui| {
                if let Some(width) = layout.width() {
                    ui.set_max_width(width as f32);
                }
                for child in &children {
                    render_viewable(ui, child);
                }
            });
        }
        LayoutKind::Tabs => render_tabs(ui, layout, &children),
    }
}

fn render_tabs(ui: &mut Ui, layout: &Layout, children: &[Viewable]) {
    if children.is_empty() {
        return;
    }
    let id = ui.id().with(("tabs", layout.titles()));
    let mut selected = ui.data_mut(|d| *d.get_temp_mut_or_default::<usize>(id));
    selected = selected.min(children.len() - 1);

    ui.horizontal(|ui| {
        for (index, title) in layout.titles().into_iter().enumerate() {
            let title = title.unwrap_or_else(|| format!("Tab {}", index + 1));
            ui.selectable_value(&mut selected, index, title);
        }
    });
    ui.separator();
    render_viewable(ui, &children[selected]);
    ui.data_mut(|d| d.insert_temp(id, selected));
}

/// Draw `<b>bold</b>` markup as strong text, anything else as a plain label
fn render_markup(ui: &mut Ui, text: &str) {
    match text.strip_prefix("<b>").and_then(|t| t.strip_suffix("</b>")) {
        Some(bold) => ui.label(RichText::new(bold).strong()),
        None => ui.label(text),
    };
}

/// Draw one control and push any edit back into it
pub fn render_widget(ui: &mut Ui, widget: &Widget) {
    let label = widget.name();
    let value = widget.value();
    ui.add_enabled_ui(!widget.disabled(), |ui| {
        if let Some(width) = widget.width() {
            ui.set_max_width(width as f32);
        }
        match widget.kind() {
            WidgetKind::StaticText => render_markup(ui, value.as_str().unwrap_or_default()),
            WidgetKind::Button => {
                if ui.button(label.as_str()).clicked() {
                    widget.click();
                }
            }
            WidgetKind::Toggle => {
                let mut on = value.as_bool().unwrap_or(false);
                let text = if label.is_empty() { toggle::GLYPH.to_string() } else { label };
                ui.set_max_height(toggle::MAX_HEIGHT as f32);
                if ui.toggle_value(&mut on, text).changed() {
                    widget.set_value(on);
                }
            }
            WidgetKind::Checkbox => {
                let mut checked = value.as_bool().unwrap_or(false);
                if ui.checkbox(&mut checked, label).changed() {
                    widget.set_value(checked);
                }
            }
            WidgetKind::IntSlider => {
                let mut v = match value {
                    Value::Int(i) => i,
                    other => other.as_f64().unwrap_or(0.0) as i64,
                };
                let (lo, hi) = (widget.start().unwrap_or(0.0) as i64, widget.end().unwrap_or(100.0) as i64);
                let mut slider = Slider::new(&mut v, lo..=hi).text(label);
                if let Some(step) = widget.step() {
                    slider = slider.step_by(step);
                }
                if ui.add(slider).changed() {
                    widget.set_value(v);
                }
            }
            WidgetKind::FloatSlider => {
                let mut v = value.as_f64().unwrap_or(0.0);
                let (lo, hi) = (widget.start().unwrap_or(0.0), widget.end().unwrap_or(1.0));
                let mut slider = Slider::new(&mut v, lo..=hi).text(label);
                if let Some(step) = widget.step() {
                    slider = slider.step_by(step);
                }
                if ui.add(slider).changed() {
                    widget.set_value(v);
                }
            }
            WidgetKind::RangeSlider | WidgetKind::DateRangeSlider => render_range(ui, widget, &label, &value),
            WidgetKind::DatetimeInput => {
                let mut seconds = match value {
                    Value::Date(d) => d,
                    _ => 0,
                };
                let mut drag = DragValue::new(&mut seconds).prefix(format!("{}: ", label));
                if let (Some(lo), Some(hi)) = (widget.start(), widget.end()) {
                    drag = drag.range(lo as i64..=hi as i64);
                }
                if ui.add(drag).changed() {
                    widget.set_value(Value::Date(seconds));
                }
            }
            WidgetKind::Select => {
                let options = widget.options();
                let mut selected = options.iter().position(|o| *o == value);
                ComboBox::from_id_salt(("select", widget.id()))
                    .selected_text(value.to_string())
                    .show_ui(ui, |ui| {
                        for (index, option) in options.iter().enumerate() {
                            ui.selectable_value(&mut selected, Some(index), option.to_string());
                        }
                    });
                if !label.is_empty() {
                    ui.label(label);
                }
                if let Some(option) = selected.and_then(|i| options.get(i)) {
                    if *option != value {
                        widget.set_value(option.clone());
                    }
                }
            }
            WidgetKind::MultiSelect => {
                let options = widget.options();
                let current = match &value {
                    Value::List(items) => items.clone(),
                    _ => Vec::new(),
                };
                if !label.is_empty() {
                    ui.label(label);
                }
                let mut changed = false;
                let mut chosen = Vec::new();
                for option in &options {
                    let mut on = current.contains(option);
                    changed |= ui.checkbox(&mut on, option.to_string()).changed();
                    if on {
                        chosen.push(option.clone());
                    }
                }
                if changed {
                    widget.set_value(Value::List(chosen));
                }
            }
            WidgetKind::TextInput => {
                let mut text = value.as_str().unwrap_or_default().to_string();
                ui.horizontal(|ui| {
                    ui.label(label.as_str());
                    if ui.text_edit_singleline(&mut text).changed() {
                        widget.set_value(text.clone());
                    }
                });
            }
            WidgetKind::ColorPicker => {
                let mut color = value.as_str().and_then(parse_hex).unwrap_or(Color32::BLACK);
                ui.horizontal(|ui| {
                    ui.label(label.as_str());
                    if ui.color_edit_button_srgba(&mut color).changed() {
                        widget.set_value(format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b()));
                    }
                });
            }
            WidgetKind::LiteralInput => render_literal(ui, widget, &label, &value),
        }
    });
}

fn render_range(ui: &mut Ui, widget: &Widget, label: &str, value: &Value) {
    let (mut lo, mut hi) = match value {
        Value::Tuple(items) | Value::List(items) if items.len() == 2 => (
            items[0].as_f64().unwrap_or(0.0),
            items[1].as_f64().unwrap_or(0.0),
        ),
        _ => (widget.start().unwrap_or(0.0), widget.end().unwrap_or(0.0)),
    };
    let range = widget.start().unwrap_or(f64::MIN)..=widget.end().unwrap_or(f64::MAX);
    let speed = widget.step().unwrap_or(0.1);
    ui.horizontal(|ui| {
        ui.label(label);
        let mut changed = ui.add(DragValue::new(&mut lo).range(range.clone()).speed(speed)).changed();
        changed |= ui.add(DragValue::new(&mut hi).range(range).speed(speed)).changed();
        if changed {
            widget.set_value(Value::Tuple(vec![Value::Float(lo.min(hi)), Value::Float(hi.max(lo))]));
        }
    });
}

/// Free-form entry: the edit buffer lives in egui memory and is parsed on commit
fn render_literal(ui: &mut Ui, widget: &Widget, label: &str, value: &Value) {
    let id = ui.id().with(("literal", widget.id()));
    let mut text = ui.data_mut(|d| d.get_temp::<String>(id)).unwrap_or_else(|| value.to_string());
    ui.horizontal(|ui| {
        ui.label(label);
        let response = ui.text_edit_singleline(&mut text);
        if response.lost_focus() {
            widget.set_value(parse_literal(&text));
            ui.data_mut(|d| d.remove::<String>(id));
        } else if response.has_focus() {
            ui.data_mut(|d| d.insert_temp(id, text.clone()));
        }
    });
}

/// Parse a literal as JSON, accepting Python-style booleans and None
fn parse_literal(text: &str) -> Value {
    let normalized = match text.trim() {
        "True" => "true",
        "False" => "false",
        "None" => "null",
        other => other,
    };
    match serde_json::from_str::<serde_json::Value>(&normalized.replace('\'', "\"")) {
        Ok(json) => Value::from_json(&json),
        Err(_) => Value::Str(text.to_string()),
    }
}

fn parse_hex(text: &str) -> Option<Color32> {
    let hex = text.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("3"), Value::Int(3));
        assert_eq!(parse_literal("True"), Value::Bool(true));
        assert_eq!(parse_literal("None"), Value::None);
        assert_eq!(parse_literal("'a'"), Value::Str("a".into()));
        assert_eq!(parse_literal("not json"), Value::Str("not json".into()));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff0080"), Some(Color32::from_rgb(255, 0, 128)));
        assert_eq!(parse_hex("ff0080"), None);
        assert_eq!(parse_hex("#fff"), None);
    }
}
