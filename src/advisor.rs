//! Threshold-based recommendations and anomaly alerts for current utilization

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{
    Anomaly, AnomalyKind, Recommendation, RecommendationKind, UtilizationMetrics, SEVERITY_HIGH,
};
use crate::utils::current_iso_timestamp;

/// Static limits the advisor compares metrics against; every comparison is exclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorThresholds {
    /// Recommend adding nodes above this CPU %
    pub cpu_scale_up: f64,
    /// Recommend removing a node below this CPU %
    pub cpu_scale_down: f64,
    /// Recommend larger instances above this memory %
    pub memory_scale_up: f64,
    /// Recommend more replicas when a non-zero pod count is below this
    pub min_replicas: f64,
    /// Raise a cpu_spike anomaly above this CPU %
    pub cpu_spike: f64,
    /// Raise a memory_pressure anomaly above this memory %
    pub memory_pressure: f64,
}

impl Default for AdvisorThresholds {
    fn default() -> Self {
        Self {
            cpu_scale_up: 80.0,
            cpu_scale_down: 20.0,
            memory_scale_up: 85.0,
            min_replicas: 3.0,
            cpu_spike: 95.0,
            memory_pressure: 90.0,
        }
    }
}

/// Evaluates utilization snapshots against [`AdvisorThresholds`]
#[derive(Debug, Clone, Default)]
pub struct Advisor {
    thresholds: AdvisorThresholds,
}

impl Advisor {
    pub fn new(thresholds: AdvisorThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AdvisorThresholds {
        &self.thresholds
    }

    /// Produce scale/optimize/availability advisories
    ///
    /// Each rule is evaluated independently, so anywhere from zero to three
    /// recommendations may come back (the two CPU rules exclude each other).
    pub fn recommend(&self, metrics: &UtilizationMetrics) -> Vec<Recommendation> {
        let t = &self.thresholds;
        let mut recommendations = Vec::new();

        if metrics.cpu_usage > t.cpu_scale_up {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Scale,
                target: "compute-nodes".to_string(),
                action: "Add 2 more nodes".to_string(),
                confidence: 0.92,
                reasoning: format!("CPU usage at {}% - approaching capacity", metrics.cpu_usage),
                impact: "Improved performance, $50/month cost increase".to_string(),
            });
        } else if metrics.cpu_usage < t.cpu_scale_down {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Optimize,
                target: "compute-nodes".to_string(),
                action: "Reduce node count by 1".to_string(),
                confidence: 0.85,
                reasoning: format!(
                    "CPU usage at {}% - underutilized resources",
                    metrics.cpu_usage
                ),
                impact: "Save $25/month".to_string(),
            });
        }

        if metrics.memory_usage > t.memory_scale_up {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Scale,
                target: "memory".to_string(),
                action: "Upgrade instance types".to_string(),
                confidence: 0.88,
                reasoning: format!("Memory usage at {}% - risk of OOM", metrics.memory_usage),
                impact: "Prevent crashes, $30/month cost increase".to_string(),
            });
        }

        if metrics.pod_count > 0.0 && metrics.pod_count < t.min_replicas {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Availability,
                target: "deployments".to_string(),
                action: format!("Increase replica count to {}", t.min_replicas),
                confidence: 0.90,
                reasoning: "Low pod count - improve high availability".to_string(),
                impact: "Better fault tolerance".to_string(),
            });
        }

        debug!(
            cpu = metrics.cpu_usage,
            memory = metrics.memory_usage,
            pods = metrics.pod_count,
            count = recommendations.len(),
            "recommendations evaluated"
        );

        recommendations
    }

    /// Flag critically high CPU or memory
    pub fn detect_anomalies(&self, metrics: &UtilizationMetrics) -> Vec<Anomaly> {
        let t = &self.thresholds;
        let mut anomalies = Vec::new();

        if metrics.cpu_usage > t.cpu_spike {
            anomalies.push(Anomaly {
                kind: AnomalyKind::CpuSpike,
                severity: SEVERITY_HIGH.to_string(),
                message: format!("CPU usage critically high: {}%", metrics.cpu_usage),
                timestamp: current_iso_timestamp(),
            });
        }

        if metrics.memory_usage > t.memory_pressure {
            anomalies.push(Anomaly {
                kind: AnomalyKind::MemoryPressure,
                severity: SEVERITY_HIGH.to_string(),
                message: format!("Memory usage critically high: {}%", metrics.memory_usage),
                timestamp: current_iso_timestamp(),
            });
        }

        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(cpu: f64, memory: f64, pods: f64) -> UtilizationMetrics {
        UtilizationMetrics {
            cpu_usage: cpu,
            memory_usage: memory,
            pod_count: pods,
        }
    }

    #[test]
    fn test_high_cpu_only() {
        let recs = Advisor::default().recommend(&metrics(90.0, 50.0, 5.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Scale);
        assert_eq!(recs[0].target, "compute-nodes");
        assert_eq!(recs[0].confidence, 0.92);
        assert_eq!(recs[0].reasoning, "CPU usage at 90% - approaching capacity");
    }

    #[test]
    fn test_low_cpu_optimizes() {
        let recs = Advisor::default().recommend(&metrics(12.5, 50.0, 5.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Optimize);
        assert_eq!(recs[0].confidence, 0.85);
        assert_eq!(recs[0].reasoning, "CPU usage at 12.5% - underutilized resources");
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let advisor = Advisor::default();
        assert!(advisor.recommend(&metrics(80.0, 85.0, 3.0)).is_empty());
        assert!(advisor.recommend(&metrics(20.0, 50.0, 5.0)).is_empty());
        assert!(advisor.detect_anomalies(&metrics(95.0, 90.0, 0.0)).is_empty());
    }

    #[test]
    fn test_all_rules_fire_together() {
        let recs = Advisor::default().recommend(&metrics(85.0, 92.0, 2.0));
        let kinds: Vec<RecommendationKind> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::Scale,
                RecommendationKind::Scale,
                RecommendationKind::Availability
            ]
        );
        assert_eq!(recs[1].target, "memory");
        assert_eq!(recs[2].action, "Increase replica count to 3");
        assert_eq!(recs[2].confidence, 0.90);
    }

    #[test]
    fn test_zero_pods_do_not_trigger_availability() {
        let recs = Advisor::default().recommend(&metrics(50.0, 50.0, 0.0));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_missing_metrics_default_to_zero() {
        // cpu defaults to 0, which is below the scale-down threshold
        let recs = Advisor::default().recommend(&UtilizationMetrics::default());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Optimize);
    }

    #[test]
    fn test_cpu_spike_only() {
        let anomalies = Advisor::default().detect_anomalies(&metrics(96.0, 40.0, 0.0));
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::CpuSpike);
        assert_eq!(anomalies[0].severity, "high");
        assert_eq!(anomalies[0].message, "CPU usage critically high: 96%");
    }

    #[test]
    fn test_both_anomalies() {
        let anomalies = Advisor::default().detect_anomalies(&metrics(99.0, 97.5, 4.0));
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[1].kind, AnomalyKind::MemoryPressure);
        assert_eq!(anomalies[1].message, "Memory usage critically high: 97.5%");
    }

    #[test]
    fn test_repeatable_output() {
        let advisor = Advisor::default();
        let input = metrics(91.0, 88.0, 1.0);
        assert_eq!(advisor.recommend(&input), advisor.recommend(&input));

        let strip = |a: Vec<Anomaly>| a.into_iter().map(|x| (x.kind, x.message)).collect::<Vec<_>>();
        assert_eq!(
            strip(advisor.detect_anomalies(&input)),
            strip(advisor.detect_anomalies(&input))
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let advisor = Advisor::new(AdvisorThresholds {
            cpu_scale_up: 60.0,
            ..AdvisorThresholds::default()
        });
        assert_eq!(advisor.recommend(&metrics(65.0, 10.0, 5.0)).len(), 1);
    }
}
