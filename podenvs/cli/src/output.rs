use std::io::Write;

use podenvs_kube::env::ResolvedEnvMap;

use crate::{config::OutputFormat, error::RenderError};

/// Prints `envs` to `out` in `format`.
pub(crate) fn render<W>(
    envs: &ResolvedEnvMap,
    format: OutputFormat,
    mut out: W,
) -> Result<(), RenderError>
where
    W: Write,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, envs)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut out, envs)?,
        OutputFormat::Export => {
            for (name, value) in envs.sorted() {
                writeln!(out, "export {name}={}", shell_quote(value))?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Double-quotes `value` for a POSIX shell, escaping what the shell would otherwise expand.
fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');

    for c in value.chars() {
        match c {
            '"' | '\\' | '$' | '`' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn rendered(envs: &ResolvedEnvMap, format: OutputFormat) -> String {
        let mut out = Vec::new();
        render(envs, format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn json_keeps_resolution_order() {
        let envs = ResolvedEnvMap::from_iter([("PORT", "8080"), ("HOST", "0.0.0.0")]);

        assert_eq!(
            rendered(&envs, OutputFormat::Json),
            "{\n  \"PORT\": \"8080\",\n  \"HOST\": \"0.0.0.0\"\n}\n"
        );
    }

    #[test]
    fn yaml() {
        let envs = ResolvedEnvMap::from_iter([("PORT", "8080"), ("UNSET", "")]);

        assert_eq!(
            rendered(&envs, OutputFormat::Yaml),
            "PORT: '8080'\nUNSET: ''\n"
        );
    }

    #[test]
    fn export_sorts_keys() {
        let envs = ResolvedEnvMap::from_iter([("PORT", "8080"), ("DB_PASS", "s3cr3t")]);

        assert_eq!(
            rendered(&envs, OutputFormat::Export),
            "export DB_PASS=\"s3cr3t\"\nexport PORT=\"8080\"\n"
        );
    }

    #[test]
    fn empty_map() {
        let envs = ResolvedEnvMap::new();

        assert_eq!(rendered(&envs, OutputFormat::Json), "{}\n");
        assert_eq!(rendered(&envs, OutputFormat::Export), "");
    }

    #[rstest]
    #[case("plain", r#""plain""#)]
    #[case("", r#""""#)]
    #[case(r#"say "hi""#, r#""say \"hi\"""#)]
    #[case("$HOME`id`", r#""\$HOME\`id\`""#)]
    #[case("a\\b", r#""a\\b""#)]
    #[case("line\nbreak", r#""line\nbreak""#)]
    #[case("\u{1b}[0m", r#""\x1b[0m""#)]
    fn quotes_for_shell(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(shell_quote(value), expected);
    }
}
