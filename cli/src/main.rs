use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use yubikey_attestation::{
    AttestationCertificateFactory, CaRegistry, Error, RegistryConfig,
};

const LOG: &str = "yubikey-attestation";

/// Directory the trusted roots are read from when neither `--config` nor `--ca-dir` is given.
const DEFAULT_CA_DIR: &str = "res";

#[derive(Debug, Parser)]
#[command(name = "yubikey-attestation", version, about = "Verify YubiKey PIV attestation certificates")]
struct Cli {
    /// JSON registry configuration naming the trusted root files
    #[arg(long, value_name = "FILE", global = true, conflicts_with = "ca_dir")]
    config: Option<PathBuf>,

    /// Directory holding the trusted roots under their default file names
    #[arg(long, value_name = "DIR", global = true)]
    ca_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify a slot attestation against its intermediate and print what it attests
    Verify {
        /// Attestation certificate of the slot, PEM or DER
        leaf: PathBuf,
        /// Attestation intermediate read from slot f9, PEM or DER
        intermediate: PathBuf,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode certificates without verifying their chain
    Inspect {
        #[arg(required = true)]
        certificates: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Verify {
            leaf,
            intermediate,
            json,
        } => verify(&cli, leaf, intermediate, *json),
        Command::Inspect { certificates } => inspect(certificates),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            e.log_error();
            ExitCode::FAILURE
        }
    }
}

fn registry_config(cli: &Cli) -> Result<RegistryConfig, Error> {
    match (&cli.config, &cli.ca_dir) {
        (Some(path), _) => RegistryConfig::from_json_file(path),
        (None, Some(dir)) => Ok(RegistryConfig::new(dir)),
        (None, None) => Ok(RegistryConfig::new(DEFAULT_CA_DIR)),
    }
}

fn read(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn verify(cli: &Cli, leaf: &Path, intermediate: &Path, json: bool) -> Result<ExitCode, Error> {
    let registry = CaRegistry::load(&registry_config(cli)?)?;
    let record = AttestationCertificateFactory::new(&registry)
        .build(&read(leaf)?, &read(intermediate)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", record);
    }
    Ok(ExitCode::SUCCESS)
}

fn inspect(certificates: &[PathBuf]) -> Result<ExitCode, Error> {
    let mut failed = false;
    for path in certificates {
        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        match read(path).and_then(|content| AttestationCertificateFactory::inspect(&content)) {
            Ok(record) => println!("File {}:\n  {}\n", name, record),
            Err(e) => {
                log::error!(target: LOG, "{}: {}", path.display(), e);
                failed = true;
            }
        }
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_verify() {
        let cli = Cli::parse_from([
            "yubikey-attestation",
            "--ca-dir",
            "/etc/yubico",
            "verify",
            "leaf.pem",
            "f9.pem",
            "--json",
        ]);
        assert!(matches!(cli.command, Command::Verify { json: true, .. }));
        let config = registry_config(&cli).unwrap();
        assert_eq!(config.resource_dir, PathBuf::from("/etc/yubico"));
    }

    #[test]
    fn test_config_conflicts_with_ca_dir() {
        assert!(Cli::try_parse_from([
            "yubikey-attestation",
            "--config",
            "registry.json",
            "--ca-dir",
            "res",
            "inspect",
            "a.pem",
        ])
        .is_err());
    }

    #[test]
    fn test_inspect_needs_certificates() {
        assert!(Cli::try_parse_from(["yubikey-attestation", "inspect"]).is_err());
        let cli = Cli::parse_from(["yubikey-attestation", "inspect", "a.pem", "b.der"]);
        assert!(matches!(cli.command, Command::Inspect { certificates } if certificates.len() == 2));
    }
}
