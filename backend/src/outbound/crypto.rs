//! CMS envelope encryption with OpenSSL.
//!
//! Files are enveloped for the dokumentlager certificate with AES-256-CBC
//! and emitted as DER, the format Fiks decrypts.

use openssl::cms::{CMSOptions, CmsContentInfo};
use openssl::stack::Stack;
use openssl::symm::Cipher;
use openssl::x509::X509;

use crate::domain::ports::{DocumentEncryptor, EncryptionError};

#[derive(Debug, Clone, Copy, Default)]
pub struct CmsDocumentEncryptor;

fn parse_certificate(certificate: &[u8]) -> Result<X509, EncryptionError> {
    X509::from_pem(certificate)
        .or_else(|_| X509::from_der(certificate))
        .map_err(|err| EncryptionError::certificate(err.to_string()))
}

impl DocumentEncryptor for CmsDocumentEncryptor {
    fn encrypt(&self, data: &[u8], certificate: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let recipient = parse_certificate(certificate)?;
        let mut recipients =
            Stack::new().map_err(|err| EncryptionError::encrypt(err.to_string()))?;
        recipients
            .push(recipient)
            .map_err(|err| EncryptionError::encrypt(err.to_string()))?;
        CmsContentInfo::encrypt(&recipients, data, Cipher::aes_256_cbc(), CMSOptions::BINARY)
            .and_then(|envelope| envelope.to_der())
            .map_err(|err| EncryptionError::encrypt(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::hash::MessageDigest;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::x509::X509NameBuilder;
    use rstest::{fixture, rstest};

    struct Recipient {
        key: PKey<Private>,
        certificate: X509,
    }

    #[fixture]
    fn recipient() -> Recipient {
        let key = PKey::from_rsa(Rsa::generate(2048).expect("rsa key")).expect("pkey");
        let mut name = X509NameBuilder::new().expect("name builder");
        name.append_entry_by_text("CN", "dokumentlager.test")
            .expect("cn");
        let name = name.build();
        let mut builder = X509::builder().expect("x509 builder");
        builder.set_version(2).expect("version");
        builder.set_subject_name(&name).expect("subject");
        builder.set_issuer_name(&name).expect("issuer");
        builder.set_pubkey(&key).expect("pubkey");
        builder
            .set_not_before(&Asn1Time::days_from_now(0).expect("not before"))
            .expect("set not before");
        builder
            .set_not_after(&Asn1Time::days_from_now(1).expect("not after"))
            .expect("set not after");
        builder.sign(&key, MessageDigest::sha256()).expect("sign");
        Recipient {
            key,
            certificate: builder.build(),
        }
    }

    #[rstest]
    #[case::pem(true)]
    #[case::der(false)]
    fn encrypted_file_decrypts_with_the_recipient_key(recipient: Recipient, #[case] pem: bool) {
        let encoded = if pem {
            recipient.certificate.to_pem().expect("pem")
        } else {
            recipient.certificate.to_der().expect("der")
        };

        let encrypted = CmsDocumentEncryptor
            .encrypt(b"%PDF-1.7 lonnslipp", &encoded)
            .expect("encrypts");
        assert_ne!(encrypted.as_slice(), b"%PDF-1.7 lonnslipp".as_slice());

        let envelope = CmsContentInfo::from_der(&encrypted).expect("cms envelope");
        let decrypted = envelope
            .decrypt(&recipient.key, &recipient.certificate)
            .expect("decrypts");
        assert_eq!(decrypted, b"%PDF-1.7 lonnslipp".to_vec());
    }

    #[rstest]
    fn garbage_certificate_is_rejected() {
        let error = CmsDocumentEncryptor
            .encrypt(b"data", b"not a certificate")
            .expect_err("must fail");
        assert!(matches!(error, EncryptionError::Certificate { .. }));
    }
}
