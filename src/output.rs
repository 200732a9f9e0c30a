use crate::component::ComponentType;
use crate::statement::StatementDefinition;
use clap::ValueEnum;
use owo_colors::Style;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Human readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Text styles; plain when stdout is not a terminal
#[derive(Debug, Clone)]
pub struct Theme {
    colored: bool,
    header: Style,
    sql: Style,
    muted: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() { Self::colored() } else { Self::plain() }
    }

    pub fn colored() -> Self {
        Self {
            colored: true,
            header: Style::new().cyan().bold(),
            sql: Style::new().green(),
            muted: Style::new().bright_black(),
        }
    }

    pub fn plain() -> Self {
        Self { colored: false, header: Style::new(), sql: Style::new(), muted: Style::new() }
    }

    fn paint(&self, style: Style, text: impl std::fmt::Display) -> String {
        if self.colored {
            format!("{}", style.style(text))
        } else {
            text.to_string()
        }
    }
}

#[derive(Serialize)]
struct LinksReport<'a> {
    component: &'a ComponentType,
    links: &'a BTreeSet<ComponentType>,
}

#[derive(Serialize)]
struct NlsReport<'a> {
    component: &'a ComponentType,
    uses_localized_column: bool,
    localized_properties: &'a BTreeSet<String>,
}

pub fn render_statement(statement: &StatementDefinition, mode: OutputMode, theme: &Theme) -> anyhow::Result<String> {
    if mode == OutputMode::Json {
        return Ok(serde_json::to_string_pretty(statement)?);
    }

    let mut out = String::new();
    out.push_str(&format!("Statement: {}\n", theme.paint(theme.header, &statement.id)));
    out.push_str(&format!("Command:   {:?}\n", statement.command));
    out.push_str(&format!("SQL:       {}\n", theme.paint(theme.sql, &statement.sql)));
    for binding in &statement.parameters {
        out.push_str(&format!("  ?{} <- {} ({})", binding.index, binding.property, binding.value_type));
        if let Some(sql_type) = &binding.sql_type {
            out.push_str(&format!(" sql_type={}", sql_type));
        }
        if let Some(handler) = &binding.type_handler {
            out.push_str(&format!(" handler={}", handler));
        }
        out.push('\n');
    }
    if let Some(result) = &statement.result {
        let columns: Vec<_> = result.columns.iter().map(|c| c.column.as_str()).collect();
        out.push_str(&format!(
            "Result:    {} [{}]{}\n",
            result.component,
            columns.join(", "),
            if result.localized { " (localized)" } else { "" }
        ));
    }
    if let Some(generation) = &statement.key_generator {
        out.push_str(&format!(
            "Key:       {} via {}\n",
            generation.property,
            generation.generator.class_name()
        ));
        if let Some(select_key) = &generation.select_key {
            out.push_str(&format!("Select key: {}\n", theme.paint(theme.sql, select_key)));
        }
    }
    let cache = &statement.cache;
    out.push_str(&format!(
        "Cache:     {} (use_cache={}, flush_cache_required={})\n",
        cache.cache.as_ref().map(|c| c.id()).unwrap_or("-"),
        cache.use_cache,
        cache.flush_cache_required
    ));
    if !cache.invalidated_by.is_empty() {
        let links: Vec<_> = cache.invalidated_by.iter().map(ComponentType::as_str).collect();
        out.push_str(&format!("Invalidated by: {}\n", theme.paint(theme.muted, links.join(", "))));
    }
    Ok(out)
}

pub fn render_links(
    component: &ComponentType,
    links: &BTreeSet<ComponentType>,
    mode: OutputMode,
    theme: &Theme,
) -> anyhow::Result<String> {
    if mode == OutputMode::Json {
        return Ok(serde_json::to_string_pretty(&LinksReport { component, links })?);
    }

    if links.is_empty() {
        return Ok(format!("{} has no linked components\n", theme.paint(theme.header, component)));
    }
    let mut out = format!("{} links to {} components:\n", theme.paint(theme.header, component), links.len());
    for link in links {
        out.push_str(&format!("- {}\n", link));
    }
    Ok(out)
}

pub fn render_nls(
    component: &ComponentType,
    uses_localized_column: bool,
    localized_properties: &BTreeSet<String>,
    mode: OutputMode,
    theme: &Theme,
) -> anyhow::Result<String> {
    if mode == OutputMode::Json {
        let report = NlsReport { component, uses_localized_column, localized_properties };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut out = format!(
        "{} {} localized columns\n",
        theme.paint(theme.header, component),
        if uses_localized_column { "uses" } else { "does not use" }
    );
    for property in localized_properties {
        out.push_str(&format!("- {}\n", property));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_links() {
        let root = ComponentType::new("a.T").unwrap();
        let links: BTreeSet<_> = [ComponentType::new("a.U").unwrap()].into_iter().collect();

        let text = render_links(&root, &links, OutputMode::Text, &Theme::plain()).unwrap();
        assert!(text.contains("- a.U"));

        let json: serde_json::Value = serde_json::from_str(&render_links(&root, &links, OutputMode::Json, &Theme::plain()).unwrap()).unwrap();
        assert_eq!(json["component"], "a.T");
        assert_eq!(json["links"][0], "a.U");
    }

    #[test]
    fn test_render_nls() {
        let root = ComponentType::new("a.T").unwrap();
        let text = render_nls(&root, false, &BTreeSet::new(), OutputMode::Text, &Theme::plain()).unwrap();
        assert_eq!(text, "a.T does not use localized columns\n");
    }

    #[test]
    fn test_render_sequence_insert() {
        use crate::metadata::{ComponentDescriptor, MetadataRegistry, PropertyDescriptor, ValueType};
        use crate::statement::{InsertStatementFactory, StatementFactory};
        use crate::ComponentConfiguration;
        use std::sync::Arc;

        let thing = ComponentDescriptor::new(ComponentType::new("a.T").unwrap())
            .with_table("T_THING")
            .with_property(
                PropertyDescriptor::new("id", ValueType::Int64)
                    .with_column("ID")
                    .with_generator_class("sequence"),
            );
        let configuration = ComponentConfiguration::new(Arc::new(MetadataRegistry::new().with(thing).unwrap()));
        let statement = InsertStatementFactory.create_statement(&configuration, "a.T/insert").unwrap();

        let text = render_statement(&statement, OutputMode::Text, &Theme::plain()).unwrap();
        assert!(text.contains("Key:       id via sequence\n"));
        assert!(text.contains("Select key: SELECT NEXT VALUE FOR SEQ_T_THING\n"));

        let json: serde_json::Value =
            serde_json::from_str(&render_statement(&statement, OutputMode::Json, &Theme::plain()).unwrap()).unwrap();
        assert_eq!(json["key_generator"]["sequence"], "SEQ_T_THING");
    }

    #[test]
    fn test_colored_theme_styles_headers() {
        let root = ComponentType::new("a.T").unwrap();
        let text = render_links(&root, &BTreeSet::new(), OutputMode::Text, &Theme::colored()).unwrap();
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("a.T"));
    }
}
