// CLI argument definitions and the pipeline driver

use crate::domain::manifest::ManifestSet;
use crate::domain::resolve::resolve_deployment;
use crate::infrastructure::output::write_resolved;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kube-envset",
    version,
    about = "Resolve container environment variables from Kubernetes manifests",
    long_about = "Scans a directory of Kubernetes YAML manifests, resolves each Deployment's \
                  container environment variables against the ConfigMaps and Secrets found in \
                  the same tree, and writes one JSON settings file per Deployment"
)]
pub struct CliArgs {
    /// Input directory containing YAML manifest files
    #[arg(value_name = "SRC")]
    pub input: PathBuf,

    /// Output directory for resolved JSON files
    #[arg(value_name = "OUT", default_value = "./out")]
    pub output: PathBuf,
}

impl CliArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let manifests = ManifestSet::load_dir(&self.input)?;

        let mut written = 0usize;
        let mut skipped = 0usize;

        for deployment in &manifests.deployments {
            // The loader only keeps named Deployments.
            let Some(name) = deployment.metadata.name.as_deref() else {
                continue;
            };

            let resolved = resolve_deployment(deployment, &manifests);
            match write_resolved(&self.output, name, &resolved)? {
                Some(path) => {
                    println!(
                        "{} {} ({} variables)",
                        "✓".green(),
                        path.display(),
                        resolved.len()
                    );
                    written += 1;
                }
                None => {
                    tracing::debug!(deployment = name, "no resolvable variables, skipping");
                    skipped += 1;
                }
            }
        }

        println!(
            "{} {} file(s) written to {}, {} deployment(s) without resolvable variables",
            "Done:".green().bold(),
            written,
            self.output.display(),
            skipped
        );

        Ok(())
    }
}
