//! TLS material attached to a request.

use crate::{Error, Result};

/// Client certificate, private key and extra trusted roots, all PEM encoded.
///
/// Everything is optional. A client certificate and key must be supplied
/// together.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub(crate) cert: Option<Vec<u8>>,
    pub(crate) key: Option<Vec<u8>>,
    pub(crate) ca: Vec<Vec<u8>>,
}

impl TlsConfig {
    /// Returns `true` if no TLS material was configured.
    pub fn is_empty(&self) -> bool {
        self.cert.is_none() && self.key.is_none() && self.ca.is_empty()
    }

    /// Applies the material to a `reqwest` client builder.
    pub(crate) fn apply(
        &self,
        mut builder: reqwest::ClientBuilder,
    ) -> Result<reqwest::ClientBuilder> {
        for pem in &self.ca {
            let root = reqwest::Certificate::from_pem(pem)
                .map_err(|e| Error::Configuration(format!("Invalid CA certificate: {}", e)))?;
            builder = builder.add_root_certificate(root);
        }

        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => {
                let mut pem = Vec::with_capacity(cert.len() + key.len() + 1);
                pem.extend_from_slice(cert);
                pem.push(b'\n');
                pem.extend_from_slice(key);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    Error::Configuration(format!("Invalid client certificate: {}", e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(Error::Configuration(
                    "Client certificate and key must be provided together".to_string(),
                ))
            }
        }

        Ok(builder)
    }
}
