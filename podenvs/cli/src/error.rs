use miette::Diagnostic;
use podenvs_kube::error::PodEnvError;
use thiserror::Error;

pub(crate) type CliResult<T, E = CliError> = core::result::Result<T, E>;

const GENERAL_HELP: &str = r#"

- Check that the current kube context points at the cluster the pod runs in.

- Run with `RUST_LOG=podenvs_kube=debug` to see what is being resolved.
"#;

#[derive(Debug, Error, Diagnostic)]
pub(crate) enum CliError {
    #[error("Failed to create the async runtime: {0}")]
    RuntimeError(std::io::Error),

    #[error("no 'name' flag provided")]
    #[diagnostic(help("Pass `--name <POD>`, or `-` as the last argument to read the pod from stdin."))]
    MissingPodName,

    #[error("Failed to create Kubernetes API client: {0}")]
    #[diagnostic(help("Check your kubeconfig and `--context`.{GENERAL_HELP}"))]
    CreateKubeApiFailed(PodEnvError),

    #[error("Failed to read the pod document from `{0}`: {1}")]
    ReadPodDocument(String, std::io::Error),

    #[error("failed to get the pod {name}/{namespace}: {source}")]
    #[diagnostic(help("{GENERAL_HELP}"))]
    GetPodFailed {
        name: String,
        namespace: String,
        #[source]
        source: PodEnvError,
    },

    #[error("failed to read the pod from {origin}: {source}")]
    #[diagnostic(help("The document must be a single Pod in yaml or json."))]
    ParsePodDocument {
        origin: String,
        #[source]
        source: PodEnvError,
    },

    #[error(transparent)]
    #[diagnostic(help("Pick one of the listed containers with `--container <NAME>`."))]
    ContainerNotFound(PodEnvError),

    #[error(transparent)]
    #[diagnostic(help(
        "The referenced configmap/secret/key must exist and be readable with your credentials.{GENERAL_HELP}"
    ))]
    ResolveEnvFailed(PodEnvError),

    #[error("failed to print the envs: {0}")]
    Render(#[from] RenderError),
}

impl From<PodEnvError> for CliError {
    fn from(error: PodEnvError) -> Self {
        match error {
            PodEnvError::ContainerNotFound { .. } => CliError::ContainerNotFound(error),
            other => CliError::ResolveEnvFailed(other),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum RenderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
