use std::path::PathBuf;

use clap::{Parser, ValueHint};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about,
    long_about = r#"
Connects to the current context of your kubeconfig to read referenced secrets/configmaps, even
if the pod is supplied through stdin.

`--exportable` takes precedence over `--yaml`.
`--container` is only required if the targeted pod has more than 1 container, otherwise it's
ignored.

You can pass the yaml/json representation of a pod to stdin using `-` as the last argument:
  $ kubectl get pod -n $NAMESPACE $POD_NAME -oyaml | podenvs -
`--name` is not required in this case and is ignored."#
)]
pub(super) struct Cli {
    /// Name of the pod. Ignored if the pod is read from stdin or a file.
    #[arg(short = 'n', long, env = "PODENVS_POD")]
    pub(super) name: Option<String>,

    /// Namespace of the pod, also used to look up referenced objects when the pod document
    /// carries no namespace.
    #[arg(long, env = "PODENVS_NAMESPACE", default_value = "default")]
    pub(super) namespace: String,

    /// Container inside that pod from which to extract envs. Unused if there's only 1
    /// container.
    #[arg(short = 'c', long, default_value = "")]
    pub(super) container: String,

    /// Prints envs in a format ready to copy and paste into terminal to export them.
    #[arg(short = 'e', long)]
    pub(super) exportable: bool,

    /// YAML output instead of JSON.
    #[arg(short = 'y', long)]
    pub(super) yaml: bool,

    /// Read the pod document (yaml or json) from this file instead of the cluster.
    #[arg(short = 'f', long, value_hint = ValueHint::FilePath, conflicts_with = "stdin")]
    pub(super) file: Option<PathBuf>,

    /// Path to the kubeconfig to use, defaults to the usual kube lookup.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub(super) kubeconfig: Option<String>,

    /// Kube context to use from the kubeconfig.
    #[arg(long)]
    pub(super) context: Option<String>,

    /// Accept invalid TLS certificates of the cluster.
    #[arg(long)]
    pub(super) accept_invalid_certificates: bool,

    /// Pass `-` to read the pod document from stdin.
    #[arg(value_parser = ["-"])]
    pub(super) stdin: Option<String>,
}

/// How the resolved env is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OutputFormat {
    Json,
    Yaml,
    Export,
}

impl Cli {
    pub(super) fn output_format(&self) -> OutputFormat {
        if self.exportable {
            OutputFormat::Export
        } else if self.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Json
        }
    }

    pub(super) fn reads_stdin(&self) -> bool {
        self.stdin.is_some()
    }

    /// Where a pod document is read from, for messages.
    pub(super) fn document_origin(&self) -> String {
        match &self.file {
            Some(path) if !self.reads_stdin() => path.display().to_string(),
            _ => "stdin".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["podenvs", "--name", "web"], OutputFormat::Json)]
    #[case(&["podenvs", "--name", "web", "-y"], OutputFormat::Yaml)]
    #[case(&["podenvs", "--name", "web", "-e"], OutputFormat::Export)]
    #[case(&["podenvs", "--name", "web", "-e", "-y"], OutputFormat::Export)]
    fn output_format_precedence(#[case] args: &[&str], #[case] expected: OutputFormat) {
        assert_eq!(Cli::parse_from(args).output_format(), expected);
    }

    #[test]
    fn stdin_dash() {
        let cli = Cli::parse_from(["podenvs", "-c", "app", "-"]);

        assert!(cli.reads_stdin());
        assert_eq!(cli.container, "app");
        assert_eq!(cli.name, None);
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["podenvs", "--name", "web"]);

        assert_eq!(cli.namespace, "default");
        assert_eq!(cli.container, "");
        assert!(!cli.reads_stdin());
        assert!(!cli.accept_invalid_certificates);
    }

    #[test]
    fn only_dash_is_a_positional() {
        assert!(Cli::try_parse_from(["podenvs", "pod.yaml"]).is_err());
    }
}
