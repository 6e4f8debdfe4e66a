use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("BACKOFF_GUARD_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("BACKOFF_GUARD_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("BACKOFF_GUARD_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("443")
            .env("BACKOFF_GUARD_PORT")
            .help("Listen on PORT"),
        Arg::new("kubeconfig")
            .long("kubeconfig")
            .value_name("KUBECONFIG")
            .env("KUBECONFIG")
            .help("Path to a kubeconfig file. The in-cluster configuration is used when not provided or not readable"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("/etc/webhook/certs/tls.crt")
            .env("BACKOFF_GUARD_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("/etc/webhook/certs/tls.key")
            .env("BACKOFF_GUARD_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("ca-file")
            .long("ca-file")
            .value_name("CA_FILE")
            .default_value("/etc/webhook/certs/ca.crt")
            .env("BACKOFF_GUARD_CA_FILE")
            .help("Path to the CA bundle the API server uses to trust the webhook certificate"),
        Arg::new("client-ca-file")
            .long("client-ca-file")
            .value_name("CLIENT_CA_FILE")
            .env("BACKOFF_GUARD_CLIENT_CA_FILE")
            .help("Path to a CA bundle used to verify client certificates. Client certificates are not verified when not provided"),
        Arg::new("disable-registration")
            .long("disable-registration")
            .env("BACKOFF_GUARD_DISABLE_REGISTRATION")
            .action(ArgAction::SetTrue)
            .help("Do not register the ValidatingWebhookConfiguration at startup"),
        Arg::new("registration-delay")
            .long("registration-delay")
            .value_name("SECONDS")
            .env("BACKOFF_GUARD_REGISTRATION_DELAY")
            .help("Seconds to wait after startup before registering the webhook [default: 10]"),
        Arg::new("registration-name")
            .long("registration-name")
            .value_name("NAME")
            .env("BACKOFF_GUARD_REGISTRATION_NAME")
            .default_value("backoff-guard")
            .help("Name of the ValidatingWebhookConfiguration managed by this process"),
        Arg::new("webhook-name")
            .long("webhook-name")
            .value_name("NAME")
            .env("BACKOFF_GUARD_WEBHOOK_NAME")
            .default_value("max-podcount.backoff-guard.io")
            .help("Fully qualified name of the webhook inside of the registration"),
        Arg::new("service-namespace")
            .long("service-namespace")
            .value_name("NAMESPACE")
            .env("BACKOFF_GUARD_SERVICE_NAMESPACE")
            .default_value("kube-system")
            .help("Namespace of the Service exposing this webhook"),
        Arg::new("service-name")
            .long("service-name")
            .value_name("NAME")
            .env("BACKOFF_GUARD_SERVICE_NAME")
            .default_value("backoff-guard")
            .help("Name of the Service exposing this webhook"),
        Arg::new("service-port")
            .long("service-port")
            .value_name("PORT")
            .env("BACKOFF_GUARD_SERVICE_PORT")
            .default_value("443")
            .help("Port of the Service exposing this webhook"),
        Arg::new("failure-policy")
            .long("failure-policy")
            .value_name("POLICY")
            .env("BACKOFF_GUARD_FAILURE_POLICY")
            .default_value("Ignore")
            .value_parser([PossibleValue::new("Ignore"), PossibleValue::new("Fail")])
            .help("What the API server does when the webhook cannot be reached"),
        Arg::new("timeout-seconds")
            .long("timeout-seconds")
            .value_name("SECONDS")
            .env("BACKOFF_GUARD_TIMEOUT_SECONDS")
            .default_value("10")
            .help("How long the API server waits for a verdict"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
