//! Usage text rendering.

use crate::{ArgumentSpec, Schema};

/// Renders the help block for a schema.
///
/// The block holds the program description, a synopsis of the mandatory
/// arguments, and a two-column table of every argument sorted by name.
///
/// # Examples
///
/// ```
/// use cmdbind_core::*;
///
/// let schema = SchemaBuilder::new()
///     .program("greet")
///     .declare(ArgumentDecl::new("name", "string").at_position(0))
///     .build()
///     .unwrap();
/// let help = render_help(&schema);
/// assert!(help.starts_with("greet --name <String>\n\n"));
/// assert!(help.contains("--help / -h"));
/// ```
pub fn render_help(schema: &Schema) -> String {
    let mut out = String::new();
    if let Some(description) = schema.description() {
        out.push_str(description.trim_end());
        out.push_str("\n\n");
    }

    let synopsis = synopsis(schema);
    if !synopsis.is_empty() {
        out.push_str(&synopsis);
        out.push_str("\n\n");
    }

    let mut specs: Vec<&ArgumentSpec> = schema.arguments().collect();
    specs.sort_by(|a, b| a.long_name().cmp(b.long_name()));
    let rows: Vec<(String, Vec<&str>)> = specs
        .into_iter()
        .map(|spec| {
            let lines = spec
                .description()
                .map(|text| text.lines().map(str::trim).collect())
                .unwrap_or_default();
            (name_column(spec), lines)
        })
        .collect();
    let width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);

    for (name, lines) in rows {
        let mut lines = lines.into_iter();
        let mut row = format!("  {name:<width$}");
        if let Some(first) = lines.next() {
            row.push_str("  ");
            row.push_str(first);
        }
        out.push_str(row.trim_end());
        out.push('\n');
        for line in lines {
            out.push_str(&" ".repeat(width + 4));
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Program name followed by the mandatory arguments: named arguments by
/// name, then positionals in index order.
fn synopsis(schema: &Schema) -> String {
    let mut mandatory: Vec<&ArgumentSpec> = schema
        .arguments()
        .filter(|spec| spec.arity().is_mandatory())
        .collect();
    mandatory.sort_by(|a, b| {
        a.positional_index()
            .cmp(&b.positional_index())
            .then_with(|| a.long_name().cmp(b.long_name()))
    });

    let mut parts: Vec<String> = schema.program().map(str::to_string).into_iter().collect();
    for spec in mandatory {
        let mut part = format!("--{}", spec.long_name());
        let syntax = spec.parser().syntax();
        if !syntax.is_empty() {
            part.push_str(&format!(" <{syntax}>"));
        }
        part.push_str(spec.arity().postfix());
        parts.push(part);
    }
    parts.join(" ")
}

fn name_column(spec: &ArgumentSpec) -> String {
    let mut column = format!("--{}", spec.long_name());
    if let Some(short) = spec.short_name() {
        column.push_str(&format!(" / -{short}"));
    }
    let syntax = spec.parser().syntax();
    if !syntax.is_empty() {
        column.push_str(&format!(" : {syntax}"));
    }
    if !spec.arity().is_many() && !spec.is_flag() {
        if let Some(default) = spec.default_value() {
            column.push_str(&format!(" = {default}"));
        }
    }
    column
}
