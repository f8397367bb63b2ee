use crate::dark_regions::options::DarkRegionOptions;
use crate::dark_regions::types::{DarkMetrics, PileupStats, RegionCategory};

pub fn is_unknown_base(base: u8) -> bool {
    base == b'N' || base == b'n'
}

/// Rounded share of reads at or below the MAPQ threshold, -1 for an uncovered locus.
pub fn percent_below_threshold(n_below: u32, total_depth: u32) -> i32 {
    if total_depth == 0 {
        return -1;
    }
    (n_below as f64 / total_depth as f64 * 100.0).round() as i32
}

/// Outcome of classifying one locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocusClassification {
    pub incomplete: bool,
    pub low_depth: bool,
    pub low_mapq: bool,
    /// Absent for incomplete loci, which are never evaluated for darkness.
    pub metrics: Option<DarkMetrics>,
}

impl LocusClassification {
    pub fn qualifies(&self, category: RegionCategory) -> bool {
        match category {
            RegionCategory::Incomplete => self.incomplete,
            RegionCategory::LowDepthDark => self.low_depth,
            RegionCategory::LowMapqDark => self.low_mapq,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LocusClassifier {
    mapq_threshold: u8,
    min_depth: u32,
    min_mapq_mass: i32,
    exclusive_regions: bool,
}

impl LocusClassifier {
    pub fn new(options: &DarkRegionOptions) -> Self {
        Self {
            mapq_threshold: options.mapq_threshold,
            min_depth: options.min_depth,
            min_mapq_mass: options.min_mapq_mass as i32,
            exclusive_regions: options.exclusive_regions,
        }
    }

    pub fn classify(&self, reference_base: u8, stats: &PileupStats) -> LocusClassification {
        if is_unknown_base(reference_base) {
            return LocusClassification {
                incomplete: true,
                low_depth: false,
                low_mapq: false,
                metrics: None,
            };
        }

        let n_below = stats.count_mapq_at_or_below(self.mapq_threshold);
        let percent = percent_below_threshold(n_below, stats.depth_including_indels);
        let metrics = DarkMetrics {
            n_below_mapq_threshold: n_below,
            depth_excluding_indels: stats.depth_excluding_indels,
            percent_below_mapq_threshold: percent,
            n_deleted_in_record: stats.n_deleted_in_record,
            depth_including_indels: stats.depth_including_indels,
        };

        let low_depth = stats.depth_excluding_indels <= self.min_depth;
        // Low depth takes precedence when the categories are exclusive.
        let low_mapq = !(self.exclusive_regions && low_depth) && percent >= self.min_mapq_mass;

        LocusClassification {
            incomplete: false,
            low_depth,
            low_mapq,
            metrics: Some(metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(exclusive: bool) -> LocusClassifier {
        LocusClassifier::new(&DarkRegionOptions::new(9, 90, 5, 3).with_exclusive_regions(exclusive))
    }

    fn stats(low: usize, high: usize) -> PileupStats {
        let mut aligned = vec![3u8; low];
        aligned.extend(std::iter::repeat(60u8).take(high));
        PileupStats::from_reads(&aligned, &[])
    }

    #[test]
    fn unknown_base_is_incomplete_only() {
        let c = classifier(false).classify(b'n', &PileupStats::uncovered());
        assert!(c.incomplete);
        assert!(!c.low_depth && !c.low_mapq);
        assert!(c.metrics.is_none());
    }

    #[test]
    fn zero_depth_is_low_depth_but_never_low_mapq() {
        let c = classifier(false).classify(b'A', &PileupStats::uncovered());
        assert!(c.low_depth);
        assert!(!c.low_mapq);
        assert_eq!(c.metrics.unwrap().percent_below_mapq_threshold, -1);
    }

    #[test]
    fn mass_threshold_is_inclusive() {
        // 9 of 10 reads below threshold: exactly 90%.
        let c = classifier(false).classify(b'C', &stats(9, 1));
        assert!(!c.low_depth);
        assert!(c.low_mapq);
        assert_eq!(c.metrics.unwrap().percent_below_mapq_threshold, 90);
    }

    #[test]
    fn exclusivity_gives_low_depth_precedence() {
        let shallow = stats(3, 0);
        assert!(classifier(false).classify(b'G', &shallow).low_mapq);
        let c = classifier(true).classify(b'G', &shallow);
        assert!(c.low_depth);
        assert!(!c.low_mapq);
    }

    #[test]
    fn deletions_count_towards_mapq_mass() {
        let stats = PileupStats::from_reads(&[60; 6], &[0; 4]);
        let c = classifier(false).classify(b'T', &stats);
        assert_eq!(c.metrics.unwrap().percent_below_mapq_threshold, 40);
        assert_eq!(c.metrics.unwrap().depth_including_indels, 10);
        assert!(!c.low_depth);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_below_threshold(1, 8), 13);
        assert_eq!(percent_below_threshold(2, 3), 67);
        assert_eq!(percent_below_threshold(0, 0), -1);
    }
}
