use crate::error::{LocateError, LocateResult};
use objrec_core::{DetectorKind, FeatureConfig};
use objrec_geometry::{GeometryConfig, RansacConfig};
use objrec_match::MatchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Polling loop settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Gate polling rate
    pub tick_hz: f64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { tick_hz: 30.0 }
    }
}

/// Complete localization configuration with all settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub features: FeatureConfig,
    pub matching: MatchConfig,
    pub ransac: RansacConfig,
    pub geometry: GeometryConfig,
    pub node: NodeConfig,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            version: None,
            features: FeatureConfig::default(),
            matching: MatchConfig::default(),
            ransac: RansacConfig::default(),
            geometry: GeometryConfig::default(),
            node: NodeConfig::default(),
        }
    }
}

impl LocatorConfig {
    /// Fewer, FAST-ranked features on a shallow pyramid
    pub fn fast_preset() -> Self {
        Self {
            features: FeatureConfig {
                detector: DetectorKind::Fast,
                threshold: 30,
                max_features: 300,
                n_levels: 2,
                ..FeatureConfig::default()
            },
            ransac: RansacConfig {
                max_iters: 500,
                ..RansacConfig::default()
            },
            ..Self::default()
        }
        .with_metadata("Fast", "Optimized for frame rate with fewer features")
    }

    /// More features over a deeper pyramid, tighter inlier threshold
    pub fn quality_preset() -> Self {
        Self {
            features: FeatureConfig {
                detector: DetectorKind::Harris,
                threshold: 15,
                max_features: 1000,
                n_levels: 8,
                ..FeatureConfig::default()
            },
            ransac: RansacConfig {
                max_iters: 4000,
                reprojection_threshold: 2.0,
                confidence: 0.999,
                min_inliers: 8,
                ..RansacConfig::default()
            },
            ..Self::default()
        }
        .with_metadata("Quality", "More features and a stricter homography fit")
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let f = &self.features;
        format!(
            "LocatorConfig{}: detector={:?}, descriptor={:?}, threshold={}, max_features={}, levels={}x{:.2}, metric={:?}, ratio={:.1}, ransac=[{} iters, {:.1}px, min {} inliers], tick={:.1}Hz",
            self.name.as_ref().map(|n| format!(" '{}'", n)).unwrap_or_default(),
            f.detector, f.descriptor, f.threshold, f.max_features, f.n_levels, f.scale_factor,
            self.matching.metric, self.matching.ratio,
            self.ransac.max_iters, self.ransac.reprojection_threshold, self.ransac.min_inliers,
            self.node.tick_hz
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> LocateResult<()> {
        let f = &self.features;
        objrec_fast::validate_config(f)?;

        let invalid = |msg: String| Err(LocateError::InvalidConfig(msg));

        if f.max_features == 0 {
            return invalid("features.max_features must be at least 1".into());
        }
        if f.n_levels == 0 || f.n_levels > u8::MAX as usize + 1 {
            return invalid(format!("features.n_levels must be in 1..=256, got {}", f.n_levels));
        }
        if !(f.scale_factor > 1.0) || !f.scale_factor.is_finite() {
            return invalid(format!("features.scale_factor must be > 1, got {}", f.scale_factor));
        }
        if !(f.nms_distance >= 0.0) || !(f.blur_sigma >= 0.0) || !f.blur_sigma.is_finite() {
            return invalid("features.nms_distance and features.blur_sigma must be >= 0".into());
        }
        if f.n_threads == 0 {
            return invalid("features.n_threads must be at least 1".into());
        }
        if !(self.matching.ratio >= 1.0) || !self.matching.ratio.is_finite() {
            return invalid(format!("matching.ratio must be >= 1, got {}", self.matching.ratio));
        }

        let r = &self.ransac;
        if r.max_iters == 0 {
            return invalid("ransac.max_iters must be at least 1".into());
        }
        if !(r.reprojection_threshold > 0.0) || !r.reprojection_threshold.is_finite() {
            return invalid(format!("ransac.reprojection_threshold must be > 0, got {}", r.reprojection_threshold));
        }
        if !(r.confidence > 0.0 && r.confidence < 1.0) {
            return invalid(format!("ransac.confidence must be in (0, 1), got {}", r.confidence));
        }
        if let Err(err) = crate::node::period_from_hz(self.node.tick_hz) {
            return invalid(format!("node.tick_hz: {}", err));
        }
        Ok(())
    }

    /// Load from a `.toml` or `.json` file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> LocateResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("toml") => Self::load_toml(path),
            Some("json") => Self::load_json(path),
            _ => Err(LocateError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> LocateResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> LocateResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> LocateResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn load_toml<P: AsRef<Path>>(path: P) -> LocateResult<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> LocateResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(toml_str: &str) -> LocateResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
