//! `formats`, `parse`, `render` and `convert` commands.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use {
    anyhow::{Context, Result},
    canon_formats::{
        CanonicalPackage, ConversionResult, Format, FormatConfig, ParseMetadata,
        render::ToolsSupport,
    },
    canon_model::Subtype,
    tracing::info,
};

pub fn list_formats(json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = Format::ALL
            .into_iter()
            .map(|format| {
                let caps = format.capabilities();
                serde_json::json!({
                    "tag": caps.tag,
                    "name": caps.display,
                    "persona": caps.persona,
                    "tools": tools_label(caps.tools),
                    "requires": requirements(format),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for format in Format::ALL {
        let caps = format.capabilities();
        let persona = if caps.persona {
            "yes"
        } else {
            "no"
        };
        println!(
            "  {:<13} {:<13} persona: {persona:<4} tools: {:<12} requires: {}",
            caps.tag,
            caps.display,
            tools_label(caps.tools),
            requirements(format),
        );
    }
    Ok(())
}

fn tools_label(tools: ToolsSupport) -> &'static str {
    match tools {
        ToolsSupport::Frontmatter => "frontmatter",
        ToolsSupport::Markdown => "markdown",
    }
}

fn requirements(format: Format) -> &'static str {
    match format {
        Format::Kiro => "inclusion (+ fileMatchPattern for fileMatch)",
        Format::Claude | Format::Cursor | Format::Copilot | Format::AgentSkills => "none",
    }
}

pub fn parse(
    file: &Path,
    from: Format,
    id: Option<String>,
    subtype: Option<Subtype>,
    output: Option<&Path>,
) -> Result<()> {
    let pkg = parse_file(file, from, id, subtype)?;
    write_output(output, &pkg.to_json()?)
}

pub fn render(
    package: &Path,
    to: Format,
    options: &FormatConfig,
    output: Option<&Path>,
) -> Result<()> {
    let raw = std::fs::read_to_string(package)
        .with_context(|| format!("failed to read {}", package.display()))?;
    let pkg = CanonicalPackage::from_json(&raw)
        .with_context(|| format!("{} is not a canonical package", package.display()))?;
    finish(to.generate(&pkg, options), output)
}

pub fn convert(
    file: &Path,
    from: Format,
    to: Format,
    id: Option<String>,
    options: &FormatConfig,
    output: Option<&Path>,
) -> Result<()> {
    let pkg = parse_file(file, from, id, None)?;
    finish(to.generate(&pkg, options), output)
}

fn parse_file(
    file: &Path,
    from: Format,
    id: Option<String>,
    subtype: Option<Subtype>,
) -> Result<CanonicalPackage> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let meta = ParseMetadata {
        id: id.unwrap_or_else(|| package_id(file)),
        subtype,
        ..Default::default()
    };
    Ok(from.parse(&raw, &meta))
}

/// Print warnings, then write the content. A conversion error becomes the
/// command's error.
fn finish(result: ConversionResult, output: Option<&Path>) -> Result<()> {
    if result.is_error() {
        anyhow::bail!("{}", result.warnings.join("; "));
    }
    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }
    info!(
        format = %result.format,
        quality_score = result.quality_score,
        lossy = result.lossy_conversion,
        "converted"
    );
    write_output(output, &result.content)?;
    eprintln!(
        "quality: {}/100{}",
        result.quality_score,
        if result.lossy_conversion {
            " (lossy)"
        } else {
            ""
        }
    );
    Ok(())
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        },
    }
}

/// Package id from a file path: the file stem, without Copilot's
/// `.instructions` suffix. `SKILL.md` takes its directory name.
pub(crate) fn package_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem = stem.strip_suffix(".instructions").unwrap_or(stem);
    if stem.eq_ignore_ascii_case("skill")
        && let Some(dir) = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|d| d.to_str())
    {
        return dir.to_string();
    }
    if stem.is_empty() {
        "package".to_string()
    } else {
        stem.to_string()
    }
}

/// Conventional file name for a document of `format`.
pub(crate) fn output_file_name(id: &str, format: Format) -> PathBuf {
    match format {
        Format::Claude | Format::Kiro => PathBuf::from(format!("{id}.md")),
        Format::Cursor => PathBuf::from(format!("{id}.mdc")),
        Format::Copilot => PathBuf::from(format!("{id}.instructions.md")),
        Format::AgentSkills => Path::new(id).join("SKILL.md"),
    }
}
