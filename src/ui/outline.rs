//! Plain-text outline of a document.
//!
//! This module provides:
//! - `OutlineLine`: one displayable line per step
//! - `build_outline`: flattens the tree in document order
//! - `render_outline`: formats the lines for a terminal, marking the selection

use crate::document::content::ContentItem;
use crate::document::tree::{Document, StepId};

/// A single step as shown in the outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineLine {
    pub step: StepId,
    /// Path of child indices from the root (empty for the root)
    pub path: Vec<usize>,
    /// Indentation depth (0 for the root)
    pub depth: usize,
    pub name: Option<String>,
    /// Short summary of the body, e.g. "Volume=2,3 | mix gently"
    pub preview: String,
    /// Trailing markers such as "[table]" or "[2 notes]"
    pub badges: Vec<String>,
}

fn preview_item(item: &ContentItem) -> String {
    match item {
        ContentItem::Text(text) => text.clone(),
        ContentItem::Parameter(param) => {
            let name = param.name().unwrap_or("?");
            let values: Vec<String> = param.values().iter().map(ToString::to_string).collect();
            if values.is_empty() {
                format!("{}=_", name)
            } else {
                format!("{}={}", name, values.join(","))
            }
        }
    }
}

/// Flattens `doc` into outline lines, root first, children in order.
pub fn build_outline(doc: &Document) -> Vec<OutlineLine> {
    let mut lines = Vec::new();
    let mut stack = vec![(doc.root(), Vec::new())];
    while let Some((id, path)) = stack.pop() {
        let Some(step) = doc.get(id) else {
            continue;
        };
        let preview = step
            .content()
            .iter()
            .map(preview_item)
            .collect::<Vec<_>>()
            .join(" | ");

        let mut badges = Vec::new();
        if step.value_table().is_some() {
            badges.push("[table]".to_string());
        }
        match step.note_count() {
            0 => {}
            1 => badges.push("[1 note]".to_string()),
            n => badges.push(format!("[{} notes]", n)),
        }
        if !step.data_refs().is_empty() {
            badges.push(format!("[{} refs]", step.data_refs().len()));
        }
        if step.experiment_info().is_some() {
            badges.push("[run]".to_string());
        }

        for (i, &child) in step.children().iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(i);
            stack.push((child, child_path));
        }
        lines.push(OutlineLine {
            step: id,
            depth: path.len(),
            path,
            name: step.name().map(str::to_string),
            preview,
            badges,
        });
    }
    lines
}

fn format_path(path: &[usize]) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        path.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Renders the outline, one step per line, prefixing selected steps with `>`.
pub fn render_outline(doc: &Document, selection: &[StepId]) -> String {
    let mut out = String::new();
    for line in build_outline(doc) {
        let marker = if selection.contains(&line.step) { '>' } else { ' ' };
        out.push(marker);
        out.push(' ');
        out.push_str(&"  ".repeat(line.depth));
        out.push_str(&format_path(&line.path));
        out.push(' ');
        out.push_str(line.name.as_deref().unwrap_or("(unnamed)"));
        if !line.preview.is_empty() {
            out.push_str(": ");
            out.push_str(&line.preview);
        }
        for badge in &line.badges {
            out.push(' ');
            out.push_str(badge);
        }
        out.push('\n');
    }
    out
}
