//! Small validation helpers shared by the configuration structs under
//! `config/`.

pub fn validate_url(url: &str) -> Result<(), String> {
    if url.len() > 2048 {
        return Err("URL cannot exceed 2048 characters".to_string());
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err("URL must start with http:// or https://".to_string());
    }
    Ok(())
}

pub fn validate_cidr(cidr: &str) -> Result<ipnetwork::IpNetwork, String> {
    cidr.parse::<ipnetwork::IpNetwork>()
        .map_err(|e| format!("invalid CIDR {cidr}: {e}"))
}

pub fn validate_domain_name(domain: &str) -> Result<(), String> {
    if domain.is_empty() || domain.len() > 253 {
        return Err(format!("invalid domain name: {domain}"));
    }
    if domain.split('.').any(|label| label.len() > 63) {
        return Err(format!("invalid domain name: {domain}"));
    }
    Ok(())
}
