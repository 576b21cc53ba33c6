use rustls::RootCertStore;
use rustls::pki_types::CertificateDer;

#[derive(Debug)]
pub enum TlsError {
    Io(std::io::Error),
    NoCertificatesFound,
    InvalidCertificate(String),
}

impl std::fmt::Display for TlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsError::Io(e) => write!(f, "TLS I/O error: {}", e),
            TlsError::NoCertificatesFound => write!(f, "no certificates found in PEM data"),
            TlsError::InvalidCertificate(msg) => write!(f, "invalid certificate: {}", msg),
        }
    }
}

impl std::error::Error for TlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TlsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TlsError {
    fn from(err: std::io::Error) -> Self {
        TlsError::Io(err)
    }
}

impl From<TlsError> for crate::Error {
    fn from(err: TlsError) -> Self {
        crate::Error::Tls(err.to_string())
    }
}

/// Parse every certificate in a PEM blob.
pub fn load_certs_from_pem(pem: &str) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = pem.as_bytes();

    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificatesFound);
    }

    Ok(certs)
}

/// Add every certificate of a PEM chain to `store`, in order.
///
/// Loading stops at the first certificate the store rejects. Anchors added
/// before that point stay in the store. Returns the number of anchors added.
pub fn add_trust_anchors(pem: &str, store: &mut RootCertStore) -> Result<usize, TlsError> {
    let mut reader = pem.as_bytes();
    let mut added = 0;

    for item in rustls_pemfile::certs(&mut reader) {
        let cert = item?;
        store
            .add(cert)
            .map_err(|e| TlsError::InvalidCertificate(e.to_string()))?;
        added += 1;
    }

    if added == 0 {
        return Err(TlsError::NoCertificatesFound);
    }

    Ok(added)
}
