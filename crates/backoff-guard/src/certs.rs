use std::{path::Path, sync::Arc};

use ::tracing::{info, warn};
use anyhow::{anyhow, Result};
use rustls::{server::WebPkiClientVerifier, RootCertStore, ServerConfig};
use rustls_pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;

/// TLS material loaded at startup. It does not change during the lifetime
/// of the process.
pub(crate) struct TlsMaterial {
    pub(crate) server_config: Arc<ServerConfig>,
    /// PEM encoded CA bundle, advertised to the API server inside of the
    /// webhook registration
    pub(crate) ca_bundle: Vec<u8>,
}

pub(crate) fn load_tls_material(tls_config: &TlsConfig) -> Result<TlsMaterial> {
    let (cert, key) = load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file)?;
    let client_verifier = match &tls_config.client_ca_file {
        Some(client_ca_file) => Some(load_client_ca_certs(client_ca_file)?),
        None => {
            warn!("client certificate verification is disabled");
            None
        }
    };
    let server_config = build_tls_server_config(cert, key, client_verifier)?;
    let ca_bundle = load_ca_bundle(&tls_config.ca_file)?;

    Ok(TlsMaterial {
        server_config: Arc::new(server_config),
        ca_bundle,
    })
}

// Build the TLS server
fn build_tls_server_config(
    cert: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    client_verifier: Option<Arc<dyn rustls::server::danger::ClientCertVerifier>>,
) -> Result<ServerConfig> {
    let builder =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?;

    if let Some(client_verifier) = client_verifier {
        return Ok(builder
            .with_client_cert_verifier(client_verifier)
            .with_single_cert(cert, key)?);
    }

    Ok(builder.with_no_client_auth().with_single_cert(cert, key)?)
}

fn parse_certificates(contents: &[u8], path: &Path) -> Vec<CertificateDer<'static>> {
    CertificateDer::pem_slice_iter(contents)
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!(path = %path.display(), "Cannot parse certificate: {e}");
            }
            it.ok()
        })
        .collect()
}

// Load the server certificate chain and key
fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_contents = std::fs::read(cert_file)
        .map_err(|e| anyhow!("Cannot read certificate file {}: {e}", cert_file.display()))?;
    let key_contents = std::fs::read(key_file)
        .map_err(|e| anyhow!("Cannot read key file {}: {e}", key_file.display()))?;

    let certs = parse_certificates(&cert_contents, cert_file);
    if certs.is_empty() {
        return Err(anyhow!(
            "Expected at least one certificate in certificate file {}",
            cert_file.display()
        ));
    }

    let keys: Vec<PrivateKeyDer> = PrivateKeyDer::pem_slice_iter(&key_contents)
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse private key: {e}");
            }
            it.ok()
        })
        .collect();

    if keys.len() != 1 {
        return Err(anyhow!(
            "Expected exactly one key in key file, found {}",
            keys.len()
        ));
    }

    Ok((certs, keys[0].clone_key()))
}

// Load the client CA certificates and build the client verifier
fn load_client_ca_certs(
    client_ca_file: &Path,
) -> Result<Arc<dyn rustls::server::danger::ClientCertVerifier>> {
    let mut store = RootCertStore::empty();
    let client_ca_contents = std::fs::read(client_ca_file).map_err(|e| {
        anyhow!(
            "Cannot read client CA file {}: {e}",
            client_ca_file.display()
        )
    })?;
    let client_ca_certs = parse_certificates(&client_ca_contents, client_ca_file);
    let (cert_added, cert_ignored) = store.add_parsable_certificates(client_ca_certs);
    info!(
        client_ca_certs_added = cert_added,
        client_ca_certs_ignored = cert_ignored,
        "Loaded client CA certificates"
    );

    WebPkiClientVerifier::builder_with_provider(
        Arc::new(store),
        Arc::new(rustls::crypto::ring::default_provider()),
    )
    .build()
    .map_err(|e| anyhow!("Cannot build client verifier: {e}"))
}

// The CA bundle is sent verbatim to the API server, make sure it holds
// something usable first
fn load_ca_bundle(ca_file: &Path) -> Result<Vec<u8>> {
    let contents = std::fs::read(ca_file)
        .map_err(|e| anyhow!("Cannot read CA file {}: {e}", ca_file.display()))?;
    if parse_certificates(&contents, ca_file).is_empty() {
        return Err(anyhow!(
            "Expected at least one certificate in CA file {}",
            ca_file.display()
        ));
    }

    Ok(contents)
}
