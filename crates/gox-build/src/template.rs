//! Output path templates.
//!
//! Templates use Go's action syntax: `{{.Dir}}`, `{{.OS}}` and `{{.Arch}}`
//! are replaced with the package directory name and the target platform.
//! Everything outside `{{ }}` is copied as-is, including a stray `}}`.
//! `{{- ` and ` -}}` trim the whitespace before and after an action.

use std::fmt;

use gox_platform::Platform;

use crate::error::TemplateError;

/// Template used when none is configured.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{{.Dir}}_{{.OS}}_{{.Arch}}";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Dir,
    Os,
    Arch,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Dir" => Some(Field::Dir),
            "OS" => Some(Field::Os),
            "Arch" => Some(Field::Arch),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Field::Dir => "Dir",
            Field::Os => "OS",
            Field::Arch => "Arch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// Values bound to a template for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateData {
    /// Last element of the package import path.
    pub dir: String,
    pub os: String,
    pub arch: String,
}

impl TemplateData {
    /// Template values for building `package` for `platform`.
    pub fn for_build(package: &str, platform: &Platform) -> Self {
        Self {
            dir: package_dir_name(package).to_string(),
            os: platform.os.clone(),
            arch: platform.arch.clone(),
        }
    }
}

/// The last element of an import path (`github.com/me/app` → `app`).
pub fn package_dir_name(package: &str) -> &str {
    let trimmed = package.trim_end_matches('/');
    if trimmed.is_empty() {
        return package;
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// A parsed output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    segments: Vec<Segment>,
}

impl OutputTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            let body_start = start + OPEN.len();
            let len = rest[body_start..]
                .find(CLOSE)
                .ok_or(TemplateError::Unclosed {
                    offset: offset + start,
                })?;
            let (action, trim_before, trim_after) =
                trim_markers(&rest[body_start..body_start + len]);

            let text = &rest[..start];
            let text = if trim_before {
                text.trim_end_matches(is_space)
            } else {
                text
            };
            if !text.is_empty() {
                segments.push(Segment::Text(text.to_string()));
            }
            segments.push(Segment::Field(parse_action(action)?));

            let mut consumed = body_start + len + CLOSE.len();
            if trim_after {
                let after = &rest[consumed..];
                consumed += after.len() - after.trim_start_matches(is_space).len();
            }
            rest = &rest[consumed..];
            offset += consumed;
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, data: &TemplateData) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(Field::Dir) => out.push_str(&data.dir),
                Segment::Field(Field::Os) => out.push_str(&data.os),
                Segment::Field(Field::Arch) => out.push_str(&data.arch),
            }
        }
        out
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Split `- .Dir -` into the action and its trim markers. A marker needs
/// whitespace between it and the action, so `{{-.Dir}}` is not trimmed.
fn trim_markers(action: &str) -> (&str, bool, bool) {
    let (action, before) = match action.strip_prefix('-') {
        Some(body) if body.starts_with(is_space) => (body, true),
        _ => (action, false),
    };
    let (action, after) = match action.strip_suffix('-') {
        Some(body) if body.ends_with(is_space) => (body, true),
        _ => (action, false),
    };
    (action, before, after)
}

fn parse_action(action: &str) -> Result<Field, TemplateError> {
    let trimmed = action.trim();
    let bad = || TemplateError::BadAction {
        action: action.to_string(),
    };
    let name = trimmed.strip_prefix('.').ok_or_else(bad)?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(bad());
    }
    Field::from_name(name).ok_or_else(|| TemplateError::UnknownField {
        field: name.to_string(),
    })
}

impl fmt::Display for OutputTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Field(field) => write!(f, "{{{{.{}}}}}", field.name())?,
            }
        }
        Ok(())
    }
}

/// Parse and render in one step.
pub fn render_template(source: &str, data: &TemplateData) -> Result<String, TemplateError> {
    Ok(OutputTemplate::parse(source)?.render(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(dir: &str, os: &str, arch: &str) -> TemplateData {
        TemplateData {
            dir: dir.into(),
            os: os.into(),
            arch: arch.into(),
        }
    }

    #[test]
    fn default_template() {
        let out = render_template(DEFAULT_OUTPUT_TEMPLATE, &data("app", "linux", "amd64")).unwrap();
        assert_eq!(out, "app_linux_amd64");
    }

    #[test]
    fn nested_directories_and_repeats() {
        let out = render_template(
            "dist/{{.OS}}/{{.Arch}}/{{.Dir}}-{{.OS}}",
            &data("server", "darwin", "arm64"),
        )
        .unwrap();
        assert_eq!(out, "dist/darwin/arm64/server-darwin");
    }

    #[test]
    fn whitespace_inside_actions() {
        let out = render_template("{{ .Dir }}.{{.Arch }}", &data("a", "b", "c")).unwrap();
        assert_eq!(out, "a.c");
    }

    #[test]
    fn trim_markers_strip_surrounding_whitespace() {
        let out = render_template(
            "bin/ {{- .Dir -}} \n_{{- .OS }} {{.Arch -}}  ",
            &data("app", "linux", "amd64"),
        )
        .unwrap();
        assert_eq!(out, "bin/app_linux amd64");
    }

    #[test]
    fn trim_marker_needs_a_space() {
        assert!(matches!(
            OutputTemplate::parse("{{-.Dir}}"),
            Err(TemplateError::BadAction { .. })
        ));
        let tpl = OutputTemplate::parse("a {{- .Dir -}} b").unwrap();
        assert_eq!(tpl.to_string(), "a{{.Dir}}b");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render_template("bin/tool", &data("x", "y", "z")).unwrap(), "bin/tool");
        assert_eq!(render_template("a}}b", &data("x", "y", "z")).unwrap(), "a}}b");
        assert_eq!(render_template("", &data("x", "y", "z")).unwrap(), "");
    }

    #[test]
    fn unknown_field() {
        let err = OutputTemplate::parse("{{.Dir}}_{{.Version}}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownField {
                field: "Version".into()
            }
        );
    }

    #[test]
    fn fields_are_case_sensitive() {
        assert!(matches!(
            OutputTemplate::parse("{{.os}}"),
            Err(TemplateError::UnknownField { .. })
        ));
    }

    #[test]
    fn unclosed_action_reports_offset() {
        let err = OutputTemplate::parse("out/{{.Dir}}_{{.OS").unwrap_err();
        assert_eq!(err, TemplateError::Unclosed { offset: 13 });
    }

    #[test]
    fn bad_actions() {
        for src in ["{{}}", "{{Dir}}", "{{.}}", "{{.Dir | upper}}", "{{ . OS }}"] {
            assert!(
                matches!(OutputTemplate::parse(src), Err(TemplateError::BadAction { .. })),
                "{src:?} should be a bad action"
            );
        }
    }

    #[test]
    fn display_normalises_actions() {
        let tpl = OutputTemplate::parse("x/{{ .Dir }}_{{.OS}}").unwrap();
        assert_eq!(tpl.to_string(), "x/{{.Dir}}_{{.OS}}");
    }

    #[test]
    fn dir_is_last_import_path_element() {
        assert_eq!(package_dir_name("github.com/acme/tool/cmd/server"), "server");
        assert_eq!(package_dir_name("app"), "app");
        assert_eq!(package_dir_name("_/home/me/src/app/"), "app");
        assert_eq!(package_dir_name("."), ".");
    }

    #[test]
    fn data_for_build() {
        let d = TemplateData::for_build("example.com/cli", &Platform::new("windows", "386"));
        assert_eq!(d, data("cli", "windows", "386"));
    }
}
