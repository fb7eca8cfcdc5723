//! Maps a declared storage-provider name onto the transport parameters the
//! rclone remote needs. The table is fixed; unknown names fall back to a
//! generic profile that demands both region and endpoint.

/// Whether a profile needs `S3_REGION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRule {
    Required,
    /// May be omitted; the given literal is used instead.
    OptionalWithDefault(&'static str),
}

/// Whether a profile needs `S3_ENDPOINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRule {
    Required,
    /// Must not be set; the rendered endpoint is the empty string.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    /// rclone `provider = ...` token.
    pub kind: &'static str,
    pub region: RegionRule,
    pub endpoint: EndpointRule,
}

/// Resolves a provider name (case-insensitive) to its profile.
pub fn resolve_provider(name: &str) -> ProviderProfile {
    match name.to_ascii_lowercase().as_str() {
        "aws" => ProviderProfile {
            kind: "AWS",
            region: RegionRule::Required,
            endpoint: EndpointRule::Forbidden,
        },
        "cloudflare" | "r2" => ProviderProfile {
            kind: "Cloudflare",
            region: RegionRule::OptionalWithDefault("auto"),
            endpoint: EndpointRule::Required,
        },
        "minio" => ProviderProfile {
            kind: "Minio",
            region: RegionRule::Required,
            endpoint: EndpointRule::Required,
        },
        "digitalocean" => ProviderProfile {
            kind: "DigitalOcean",
            region: RegionRule::Required,
            endpoint: EndpointRule::Required,
        },
        _ => ProviderProfile {
            kind: "Other",
            region: RegionRule::Required,
            endpoint: EndpointRule::Required,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_requires_region_and_forbids_endpoint() {
        let profile = resolve_provider("aws");
        assert_eq!(profile.kind, "AWS");
        assert_eq!(profile.region, RegionRule::Required);
        assert_eq!(profile.endpoint, EndpointRule::Forbidden);
    }

    #[test]
    fn cloudflare_and_r2_share_a_profile_with_auto_region() {
        for name in ["cloudflare", "r2", "Cloudflare", "R2"] {
            let profile = resolve_provider(name);
            assert_eq!(profile.kind, "Cloudflare");
            assert_eq!(profile.region, RegionRule::OptionalWithDefault("auto"));
            assert_eq!(profile.endpoint, EndpointRule::Required);
        }
    }

    #[test]
    fn unknown_provider_falls_back_to_generic() {
        let profile = resolve_provider("wasabi");
        assert_eq!(profile.kind, "Other");
        assert_eq!(profile.region, RegionRule::Required);
        assert_eq!(profile.endpoint, EndpointRule::Required);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(resolve_provider("AWS").kind, "AWS");
        assert_eq!(resolve_provider("MinIO").kind, "Minio");
        assert_eq!(resolve_provider("DigitalOcean").kind, "DigitalOcean");
    }
}
