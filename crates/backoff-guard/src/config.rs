use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::registration::DEFAULT_REGISTRATION_DELAY;

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

/// Settings of the process, built once at startup and never changed afterwards
#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub kubeconfig: Option<PathBuf>,
    pub tls_config: TlsConfig,
    /// `None` when self registration is disabled
    pub registration: Option<RegistrationConfig>,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub ca_file: PathBuf,
    pub client_ca_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationConfig {
    /// Name of the ValidatingWebhookConfiguration object
    pub name: String,
    /// Name of the webhook defined inside of the ValidatingWebhookConfiguration
    pub webhook_name: String,
    pub service_namespace: String,
    pub service_name: String,
    pub service_port: i32,
    pub failure_policy: String,
    pub timeout_seconds: i32,
    pub delay: Duration,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let kubeconfig = matches.get_one::<String>("kubeconfig").map(PathBuf::from);
        let tls_config = tls_config(matches);

        let disable_registration = matches
            .get_one::<bool>("disable-registration")
            .expect("clap should have set a default value")
            .to_owned();
        let registration = if disable_registration {
            None
        } else {
            Some(registration_config(matches)?)
        };

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            kubeconfig,
            tls_config,
            registration,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches.get_one::<String>("address").unwrap(),
        matches.get_one::<String>("port").unwrap()
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> TlsConfig {
    let path_of = |id: &str| {
        matches
            .get_one::<String>(id)
            .map(PathBuf::from)
            .expect("clap should have set a default value")
    };

    TlsConfig {
        cert_file: path_of("cert-file"),
        key_file: path_of("key-file"),
        ca_file: path_of("ca-file"),
        client_ca_file: matches.get_one::<String>("client-ca-file").map(PathBuf::from),
    }
}

fn registration_config(matches: &ArgMatches) -> Result<RegistrationConfig> {
    let string_of = |id: &str| {
        matches
            .get_one::<String>(id)
            .expect("clap should have set a default value")
            .to_owned()
    };

    let delay = match matches.get_one::<String>("registration-delay") {
        Some(seconds) => Duration::from_secs(
            seconds
                .parse::<u64>()
                .map_err(|e| anyhow!("error parsing --registration-delay: {}", e))?,
        ),
        None => DEFAULT_REGISTRATION_DELAY,
    };
    let service_port = string_of("service-port")
        .parse::<i32>()
        .map_err(|e| anyhow!("error parsing --service-port: {}", e))?;
    let timeout_seconds = string_of("timeout-seconds")
        .parse::<i32>()
        .map_err(|e| anyhow!("error parsing --timeout-seconds: {}", e))?;
    if !(1..=30).contains(&timeout_seconds) {
        return Err(anyhow!(
            "error parsing --timeout-seconds: must be between 1 and 30, got {}",
            timeout_seconds
        ));
    }

    Ok(RegistrationConfig {
        name: string_of("registration-name"),
        webhook_name: string_of("webhook-name"),
        service_namespace: string_of("service-namespace"),
        service_name: string_of("service-name"),
        service_port,
        failure_policy: string_of("failure-policy"),
        timeout_seconds,
        delay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;
    use rstest::*;

    fn config_from(flags: &[&str]) -> Result<Config> {
        let mut args = vec!["backoff-guard"];
        args.extend_from_slice(flags);
        let matches = cli::build_cli().try_get_matches_from(args).unwrap();
        Config::from_args(&matches)
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr, "0.0.0.0:443".parse().unwrap());
        assert_eq!(config.tls_config.client_ca_file, None);
        assert_eq!(config.log_fmt, "text");

        let registration = config.registration.expect("registration should be enabled");
        assert_eq!(registration.delay, DEFAULT_REGISTRATION_DELAY);
        assert_eq!(registration.service_namespace, "kube-system");
        assert_eq!(registration.service_port, 443);
        assert_eq!(registration.failure_policy, "Ignore");
    }

    #[test]
    fn custom_values() {
        let config = config_from(&[
            "--addr=127.0.0.1",
            "--port=8443",
            "--kubeconfig=/home/user/.kube/config",
            "--client-ca-file=/tmp/client-ca.pem",
            "--registration-delay=0",
            "--registration-name=job-guard",
            "--service-namespace=guards",
            "--failure-policy=Fail",
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:8443".parse().unwrap());
        assert_eq!(
            config.kubeconfig,
            Some(PathBuf::from("/home/user/.kube/config"))
        );
        assert_eq!(
            config.tls_config.client_ca_file,
            Some(PathBuf::from("/tmp/client-ca.pem"))
        );

        let registration = config.registration.unwrap();
        assert_eq!(registration.delay, Duration::ZERO);
        assert_eq!(registration.name, "job-guard");
        assert_eq!(registration.service_namespace, "guards");
        assert_eq!(registration.failure_policy, "Fail");
    }

    #[test]
    fn registration_can_be_disabled() {
        let config = config_from(&["--disable-registration"]).unwrap();
        assert!(config.registration.is_none());
    }

    #[rstest]
    #[case::bad_port(&["--port=not-a-port"])]
    #[case::bad_delay(&["--registration-delay=soon"])]
    #[case::bad_service_port(&["--service-port=https"])]
    #[case::timeout_too_long(&["--timeout-seconds=60"])]
    fn invalid_values(#[case] flags: &[&str]) {
        assert!(config_from(flags).is_err());
    }
}
