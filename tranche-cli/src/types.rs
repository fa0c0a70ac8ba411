//! Common types used across CLI modules

use tranche_core::dto::pool::ImageReference;
use uuid::Uuid;

/// Default marketplace image, `publisher:offer:sku:version`
pub const DEFAULT_IMAGE: &str = "Canonical:UbuntuServer:18.04-LTS:latest";

/// Parse a `publisher:offer:sku[:version]` image reference
///
/// The version defaults to `latest` when omitted.
pub fn parse_image(input: &str) -> Result<ImageReference, String> {
    let parts: Vec<&str> = input.split(':').map(str::trim).collect();

    let (publisher, offer, sku, version) = match parts.as_slice() {
        [publisher, offer, sku] => (*publisher, *offer, *sku, "latest"),
        [publisher, offer, sku, version] => (*publisher, *offer, *sku, *version),
        _ => {
            return Err(format!(
                "expected publisher:offer:sku[:version], got '{}'",
                input
            ));
        }
    };

    if [publisher, offer, sku, version].iter().any(|part| part.is_empty()) {
        return Err(format!("image reference '{}' has an empty part", input));
    }

    Ok(ImageReference {
        publisher: publisher.to_string(),
        offer: offer.to_string(),
        sku: sku.to_string(),
        version: version.to_string(),
    })
}

/// Generate a pool name like `arm-pool-1a2b3c4d`
pub fn generate_pool_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..8])
}

/// Id of the `n`th task of a job (1-based)
pub fn task_id(job_id: &str, n: usize) -> String {
    format!("{}-{}", job_id, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_image() {
        let image = parse_image(DEFAULT_IMAGE).unwrap();
        assert_eq!(image.publisher, "Canonical");
        assert_eq!(image.offer, "UbuntuServer");
        assert_eq!(image.sku, "18.04-LTS");
        assert_eq!(image.version, "latest");
    }

    #[test]
    fn test_parse_image_without_version() {
        let image = parse_image("Canonical:UbuntuServer:20.04-LTS").unwrap();
        assert_eq!(image.version, "latest");
    }

    #[test]
    fn test_parse_image_rejects_malformed() {
        assert!(parse_image("Canonical").is_err());
        assert!(parse_image("Canonical::18.04-LTS").is_err());
        assert!(parse_image("a:b:c:d:e").is_err());
    }

    #[test]
    fn test_generated_pool_name() {
        let name = generate_pool_name("arm-pool");
        assert!(name.starts_with("arm-pool-"));
        assert_eq!(name.len(), "arm-pool-".len() + 8);
        assert!(name["arm-pool-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_task_id() {
        assert_eq!(task_id("testbejob1", 7), "testbejob1-7");
    }
}
