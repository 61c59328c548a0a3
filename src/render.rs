//! Human-readable certificate text and the Organization/OU summary label.

use crate::error::{Error, Result};
use x509_parser::der_parser::asn1_rs::Tag;
use x509_parser::der_parser::oid::Oid;
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::prelude::*;

#[derive(Debug, Clone)]
pub struct CertificateDetails {
    pub version: u32,
    pub subject: String,
    pub issuer: String,
    pub serial_number: String,
    pub not_before: String,
    pub not_after: String,
    pub validity_status: String,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub public_key_size: Option<usize>,
    pub organizations: Vec<String>,
    pub organizational_units: Vec<String>,
    pub extensions: Vec<RenderedExtension>,
}

#[derive(Debug, Clone)]
pub struct RenderedExtension {
    pub name: String,
    pub critical: bool,
    pub values: Vec<String>,
}

impl CertificateDetails {
    pub fn from_der(cert_der: &[u8]) -> Result<Self> {
        let (_, x509) = X509Certificate::from_der(cert_der)
            .map_err(|e| Error::Render(format!("failed to parse certificate: {}", e)))?;

        let now = chrono::Utc::now().timestamp();
        let not_before_ts = x509.validity().not_before.timestamp();
        let not_after_ts = x509.validity().not_after.timestamp();

        let validity_status = if now < not_before_ts {
            "Not yet valid"
        } else if now > not_after_ts {
            "Expired"
        } else {
            "Valid"
        };

        let (public_key_algorithm, public_key_size) = match x509.public_key().parsed() {
            Ok(x509_parser::public_key::PublicKey::RSA(rsa)) => {
                ("RSA".to_string(), Some(rsa.key_size()))
            }
            Ok(x509_parser::public_key::PublicKey::EC(ec)) => {
                ("ECDSA".to_string(), Some(ec.key_size()))
            }
            Ok(x509_parser::public_key::PublicKey::DSA(_)) => ("DSA".to_string(), None),
            _ => (oid_name(&x509.public_key().algorithm.algorithm), None),
        };

        Ok(Self {
            version: x509.version().0 + 1,
            subject: format_dn(x509.subject()),
            issuer: format_dn(x509.issuer()),
            serial_number: format_serial(x509.raw_serial()),
            not_before: format_time(not_before_ts),
            not_after: format_time(not_after_ts),
            validity_status: validity_status.to_string(),
            signature_algorithm: oid_name(&x509.signature_algorithm.algorithm),
            public_key_algorithm,
            public_key_size,
            organizations: attribute_values(x509.subject().iter_organization()),
            organizational_units: attribute_values(x509.subject().iter_organizational_unit()),
            extensions: x509.extensions().iter().map(render_extension).collect(),
        })
    }

    pub fn label(&self) -> String {
        organization_label(&self.organizations, &self.organizational_units)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str("Certificate:\n");
        out.push_str(&format!("    Version: {}\n", self.version));
        out.push_str(&format!("    Serial Number: {}\n", self.serial_number));
        out.push_str(&format!("    Signature Algorithm: {}\n", self.signature_algorithm));
        out.push_str(&format!("    Issuer: {}\n", self.issuer));
        out.push_str("    Validity:\n");
        out.push_str(&format!("        Not Before: {}\n", self.not_before));
        out.push_str(&format!("        Not After : {}\n", self.not_after));
        out.push_str(&format!("        Status    : {}\n", self.validity_status));
        out.push_str(&format!("    Subject: {}\n", self.subject));

        out.push_str("    Subject Public Key Info:\n");
        match self.public_key_size {
            Some(bits) if bits > 0 => out.push_str(&format!(
                "        Public Key Algorithm: {} ({} bit)\n",
                self.public_key_algorithm, bits
            )),
            _ => out.push_str(&format!(
                "        Public Key Algorithm: {}\n",
                self.public_key_algorithm
            )),
        }

        if !self.extensions.is_empty() {
            out.push_str("    X509v3 extensions:\n");
            for ext in &self.extensions {
                let critical = if ext.critical { " critical" } else { "" };
                out.push_str(&format!("        {}:{}\n", ext.name, critical));
                for value in &ext.values {
                    out.push_str(&format!("            {}\n", value));
                }
            }
        }

        out
    }
}

pub fn render_certificate(cert_der: &[u8]) -> Result<String> {
    CertificateDetails::from_der(cert_der).map(|details| details.to_text())
}

/// `O: <orgs> OU: <units>`, each list joined by single spaces.
///
/// The separators stay even when a list is empty, so `[]`/`["Eng"]` gives
/// `"O:  OU: Eng"`.
pub fn organization_label<S: AsRef<str>>(organizations: &[S], units: &[S]) -> String {
    format!("O: {} OU: {}", join(organizations), join(units))
}

fn join<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute_values<'a, 'b>(
    attrs: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>,
) -> Vec<String>
where
    'b: 'a,
{
    attrs.map(attribute_text).collect()
}

// `as_str` only covers the UTF-8 compatible string types; BMPString (UTF-16BE)
// and TeletexString (treated as Latin-1) still show up in older issuers.
fn attribute_text(attr: &AttributeTypeAndValue) -> String {
    let value = attr.attr_value();
    match value.tag() {
        Tag::BmpString => char::decode_utf16(
            value
                .as_bytes()
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        )
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect(),
        Tag::T61String => value.as_bytes().iter().map(|&b| b as char).collect(),
        _ => attr.as_str().unwrap_or("?").to_string(),
    }
}

fn oid_name(oid: &Oid) -> String {
    oid2sn(oid, oid_registry())
        .map(|s| s.to_string())
        .unwrap_or_else(|_| oid.to_id_string())
}

fn format_dn(dn: &X509Name) -> String {
    let mut parts = Vec::new();

    for rdn in dn.iter() {
        for attr in rdn.iter() {
            let attr_value = attribute_text(attr);

            let name = match attr.attr_type().to_id_string().as_str() {
                "2.5.4.3" => "CN".to_string(),
                "2.5.4.10" => "O".to_string(),
                "2.5.4.11" => "OU".to_string(),
                "2.5.4.6" => "C".to_string(),
                "2.5.4.7" => "L".to_string(),
                "2.5.4.8" => "ST".to_string(),
                "2.5.4.5" => "serialNumber".to_string(),
                _ => oid_name(attr.attr_type()),
            };

            parts.push(format!("{}={}", name, attr_value));
        }
    }

    parts.join(", ")
}

fn format_serial(serial: &[u8]) -> String {
    serial
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn format_time(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%b %e %H:%M:%S %Y UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn format_ip(ip_bytes: &[u8]) -> String {
    if ip_bytes.len() == 4 {
        format!(
            "{}.{}.{}.{}",
            ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]
        )
    } else if ip_bytes.len() == 16 {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(ip_bytes);
        std::net::Ipv6Addr::from(octets).to_string()
    } else {
        format!("{:?}", ip_bytes)
    }
}

fn format_general_name(name: &GeneralName) -> String {
    match name {
        GeneralName::DNSName(dns) => format!("DNS:{}", dns),
        GeneralName::IPAddress(ip) => format!("IP Address:{}", format_ip(ip)),
        GeneralName::RFC822Name(email) => format!("email:{}", email),
        GeneralName::URI(uri) => format!("URI:{}", uri),
        GeneralName::DirectoryName(dn) => format!("DirName:{}", format_dn(dn)),
        other => format!("{:?}", other),
    }
}

fn render_extension(ext: &X509Extension) -> RenderedExtension {
    let mut name = oid_name(&ext.oid);
    let mut values = Vec::new();

    match ext.parsed_extension() {
        ParsedExtension::SubjectAlternativeName(san) => {
            name = "X509v3 Subject Alternative Name".to_string();
            values.push(
                san.general_names
                    .iter()
                    .map(format_general_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        ParsedExtension::KeyUsage(ku) => {
            name = "X509v3 Key Usage".to_string();
            let mut usages = Vec::new();
            if ku.digital_signature() {
                usages.push("Digital Signature");
            }
            if ku.non_repudiation() {
                usages.push("Non Repudiation");
            }
            if ku.key_encipherment() {
                usages.push("Key Encipherment");
            }
            if ku.data_encipherment() {
                usages.push("Data Encipherment");
            }
            if ku.key_agreement() {
                usages.push("Key Agreement");
            }
            if ku.key_cert_sign() {
                usages.push("Certificate Sign");
            }
            if ku.crl_sign() {
                usages.push("CRL Sign");
            }
            values.push(usages.join(", "));
        }
        ParsedExtension::ExtendedKeyUsage(eku) => {
            name = "X509v3 Extended Key Usage".to_string();
            let mut usages: Vec<String> = Vec::new();
            if eku.any {
                usages.push("Any Extended Key Usage".to_string());
            }
            if eku.server_auth {
                usages.push("TLS Web Server Authentication".to_string());
            }
            if eku.client_auth {
                usages.push("TLS Web Client Authentication".to_string());
            }
            if eku.code_signing {
                usages.push("Code Signing".to_string());
            }
            if eku.email_protection {
                usages.push("E-mail Protection".to_string());
            }
            if eku.time_stamping {
                usages.push("Time Stamping".to_string());
            }
            if eku.ocsp_signing {
                usages.push("OCSP Signing".to_string());
            }
            usages.extend(eku.other.iter().map(oid_name));
            values.push(usages.join(", "));
        }
        ParsedExtension::BasicConstraints(bc) => {
            name = "X509v3 Basic Constraints".to_string();
            let mut value = format!("CA:{}", if bc.ca { "TRUE" } else { "FALSE" });
            if let Some(len) = bc.path_len_constraint {
                value.push_str(&format!(", pathlen:{}", len));
            }
            values.push(value);
        }
        ParsedExtension::SubjectKeyIdentifier(kid) => {
            name = "X509v3 Subject Key Identifier".to_string();
            values.push(format_hex(kid.0));
        }
        ParsedExtension::AuthorityKeyIdentifier(aki) => {
            name = "X509v3 Authority Key Identifier".to_string();
            if let Some(kid) = &aki.key_identifier {
                values.push(format!("keyid:{}", format_hex(kid.0)));
            }
        }
        ParsedExtension::AuthorityInfoAccess(aia) => {
            name = "Authority Information Access".to_string();
            for desc in aia.iter() {
                values.push(format!(
                    "{} - {}",
                    oid_name(&desc.access_method),
                    format_general_name(&desc.access_location)
                ));
            }
        }
        ParsedExtension::CertificatePolicies(policies) => {
            name = "X509v3 Certificate Policies".to_string();
            for policy in policies.iter() {
                values.push(format!("Policy: {}", policy.policy_id.to_id_string()));
            }
        }
        _ => {}
    }

    RenderedExtension {
        name,
        critical: ext.critical,
        values,
    }
}
