//! Naming resolution: turns an admitted selection into concrete targets.

use crate::models::{AspectTarget, RenderStyle, RenderTarget, SourceFile};
use crate::naming::{
    resolve_pattern, today_stamp, BaseInfo, NameRegistry, NamingConfig, NamingPayload,
    NamingSnapshot, NamingTokens,
};

/// Container extension of every render output.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// One admitted source file with its naming inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub source: SourceFile,
    pub base: BaseInfo,
    /// Custom base name sent to the service (custom mode only).
    pub base_override: Option<String>,
    /// Probed duration in seconds, if known.
    pub duration: Option<f64>,
}

/// One render target with its batch-unique output name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTarget {
    pub target: RenderTarget,
    pub filename: String,
}

/// Everything a strategy needs to run a batch.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub batch_id: String,
    pub files: Vec<PlannedFile>,
    /// Aspect targets in selection order.
    pub aspects: Vec<AspectTarget>,
    pub style: RenderStyle,
    /// Effective naming config with the date stamp filled in.
    pub naming: NamingConfig,
    /// Files in selection order, ratios in selection order within each file.
    pub targets: Vec<PlannedTarget>,
}

impl BatchPlan {
    /// Resolve names for every (file, aspect) pair.
    ///
    /// `durations` is aligned with `files`; missing entries count as unknown.
    pub fn build(
        batch_id: impl Into<String>,
        files: Vec<SourceFile>,
        durations: &[Option<f64>],
        aspects: Vec<AspectTarget>,
        style: RenderStyle,
        naming: &NamingSnapshot,
    ) -> Self {
        let mut config = naming.config.effective();
        if config.date_stamp.trim().is_empty() {
            config.date_stamp = today_stamp();
        }

        let files: Vec<PlannedFile> = files
            .into_iter()
            .enumerate()
            .map(|(index, source)| PlannedFile {
                base: naming.base_info(&source.name),
                base_override: naming.override_for(&source.name).map(str::to_string),
                duration: durations.get(index).copied().flatten(),
                source,
            })
            .collect();

        let mut registry = NameRegistry::new();
        let mut targets = Vec::with_capacity(files.len() * aspects.len());
        for (file_index, file) in files.iter().enumerate() {
            for aspect in &aspects {
                let seq = targets.len() + 1;
                let tokens =
                    NamingTokens::for_target(&file.base, aspect, style, &config, seq, OUTPUT_EXTENSION);
                let filename = registry.ensure_unique(&resolve_pattern(&config, &tokens));
                targets.push(PlannedTarget {
                    target: RenderTarget {
                        file_index,
                        aspect: aspect.clone(),
                        style,
                    },
                    filename,
                });
            }
        }

        Self {
            batch_id: batch_id.into(),
            files,
            aspects,
            style,
            naming: config,
            targets,
        }
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Targets belonging to one file, in ratio order.
    pub fn targets_for(&self, file_index: usize) -> impl Iterator<Item = &PlannedTarget> {
        self.targets
            .iter()
            .filter(move |t| t.target.file_index == file_index)
    }

    /// Aspect keys as sent to the render service.
    pub fn ratio_keys(&self) -> Vec<String> {
        self.aspects.iter().map(|a| a.key.clone()).collect()
    }

    pub fn naming_payload(&self) -> NamingPayload {
        NamingPayload::from(&self.naming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectCatalog, NamingMode};

    fn files(names: &[&str]) -> Vec<SourceFile> {
        names
            .iter()
            .map(|n| SourceFile::new(format!("/videos/{}", n), *n, 1000))
            .collect()
    }

    fn snapshot() -> NamingSnapshot {
        NamingSnapshot::new(NamingConfig::default().with_date_stamp("2024-05-01"))
    }

    #[test]
    fn default_preset_names_targets() {
        let aspects = AspectCatalog::builtin().resolve(&["square", "portrait"]);
        let plan = BatchPlan::build(
            "b1",
            files(&["Trip_1920x1080.mov"]),
            &[Some(10.0)],
            aspects,
            RenderStyle::Fill,
            &snapshot(),
        );

        let names: Vec<&str> = plan.targets.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(names, vec!["Trip_1x1.mp4", "Trip_9x16.mp4"]);
        assert_eq!(plan.files[0].duration, Some(10.0));
        assert_eq!(plan.ratio_keys(), vec!["square", "portrait"]);
    }

    #[test]
    fn colliding_names_get_suffixes() {
        let aspects = AspectCatalog::builtin().resolve(&["square"]);
        let plan = BatchPlan::build(
            "b1",
            files(&["clip.mp4", "clip.mov"]),
            &[],
            aspects,
            RenderStyle::Blur,
            &snapshot(),
        );
        let names: Vec<&str> = plan.targets.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(names, vec!["clip_1x1.mp4", "clip_1x1__001.mp4"]);
        assert_eq!(plan.files[1].duration, None);
    }

    #[test]
    fn sequence_counts_across_files() {
        let mut config = NamingConfig::custom_defaults().with_date_stamp("2024-05-01");
        config.add_sequence = true;
        let plan = BatchPlan::build(
            "b1",
            files(&["a.mp4", "b.mp4"]),
            &[],
            AspectCatalog::builtin().resolve(&["square", "landscape"]),
            RenderStyle::Black,
            &NamingSnapshot::new(config),
        );
        let names: Vec<&str> = plan.targets.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["a_1x1__001.mp4", "a_16x9__002.mp4", "b_1x1__003.mp4", "b_16x9__004.mp4"]
        );
        assert_eq!(plan.targets_for(1).count(), 2);
    }

    #[test]
    fn custom_overrides_reach_plan() {
        let mut snapshot = NamingSnapshot::new(NamingConfig::custom_defaults());
        snapshot.overrides.insert("raw.mp4".to_string(), "Holiday".to_string());
        assert_eq!(snapshot.config.mode, NamingMode::Custom);

        let plan = BatchPlan::build(
            "b1",
            files(&["raw.mp4"]),
            &[],
            AspectCatalog::builtin().resolve(&["square"]),
            RenderStyle::Fill,
            &snapshot,
        );
        assert_eq!(plan.files[0].base_override.as_deref(), Some("Holiday"));
        assert_eq!(plan.targets[0].filename, "Holiday_1x1.mp4");
        assert!(!plan.naming.date_stamp.is_empty());
    }
}
