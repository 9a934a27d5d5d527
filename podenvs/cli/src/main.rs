use clap::Parser;
use config::Cli;
use error::{CliError, CliResult};
use podenvs_kube::{
    api::{kubernetes::create_kube_api, pod::PodSource},
    error::PodEnvError,
    reference::cluster::ClusterReferenceResolver,
    resolve_pod_env,
};
use tokio::io::AsyncReadExt;
use tracing::debug;

mod config;
mod error;
mod logging;
mod output;

/// Where the pod comes from, according to the flags.
async fn pod_source(cli: &Cli) -> CliResult<PodSource> {
    if cli.reads_stdin() {
        let mut document = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut document)
            .await
            .map_err(|fail| CliError::ReadPodDocument(cli.document_origin(), fail))?;

        Ok(PodSource::Document(document))
    } else if let Some(path) = &cli.file {
        let document = tokio::fs::read(path)
            .await
            .map_err(|fail| CliError::ReadPodDocument(cli.document_origin(), fail))?;

        Ok(PodSource::Document(document))
    } else {
        let name = cli.name.clone().ok_or(CliError::MissingPodName)?;

        Ok(PodSource::Cluster {
            name,
            namespace: cli.namespace.clone(),
        })
    }
}

/// Names the pod by where it came from: `namespace/name` for the cluster, otherwise the
/// document it was read from.
fn get_pod_error(cli: &Cli, source: &PodSource, error: PodEnvError) -> CliError {
    match source {
        PodSource::Cluster { name, namespace } => CliError::GetPodFailed {
            name: name.clone(),
            namespace: namespace.clone(),
            source: error,
        },
        PodSource::Document(_) => CliError::ParsePodDocument {
            origin: cli.document_origin(),
            source: error,
        },
    }
}

async fn print_envs(cli: Cli) -> CliResult<()> {
    let source = pod_source(&cli).await?;

    // Referenced secrets/configmaps are read from the cluster even when the pod is not.
    let client = create_kube_api(
        cli.accept_invalid_certificates,
        cli.kubeconfig.clone(),
        cli.context.clone(),
    )
    .await
    .map_err(CliError::CreateKubeApiFailed)?;

    let pod = source
        .get_pod(&client)
        .await
        .map_err(|error| get_pod_error(&cli, &source, error))?;

    let envs = resolve_pod_env(
        &pod,
        &cli.container,
        &cli.namespace,
        ClusterReferenceResolver::new(client),
    )
    .await?;
    debug!(count = envs.len(), "rendering envs");

    output::render(&envs, cli.output_format(), std::io::stdout().lock())?;

    Ok(())
}

fn main() -> miette::Result<()> {
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::aws_lc_rs::default_provider())
        .expect("Failed to install crypto provider");

    let cli = Cli::parse();
    logging::init_tracing_registry();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeError)?;

    let res: CliResult<()> = rt.block_on(print_envs(cli));

    res.map_err(Into::into)
}
