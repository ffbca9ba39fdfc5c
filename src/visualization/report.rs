use crate::matching::{MatchReport, RankedMatch};

pub fn print_report(report: &MatchReport) {
    println!("=== Pose Match ===");
    if let Some(id) = report.reference_id {
        println!("Reference pose: {}", id);
    }
    println!("  Correspondences: {}", report.correspondence_count);
    println!("  Translation: ({:.2}, {:.2})",
             report.parameters.translation_x(), report.parameters.translation_y());
    println!("  Scale: {:.4}", report.scale);
    println!(
        "  Rotation: {:.2}° (legacy {:.2}°)",
        report.signed_rotation_degrees, report.legacy_rotation_degrees
    );
    println!("  Error: {:.3} total, {:.3} per point, {:.4} normalized", 
             report.total_error, report.mean_error, report.normalized_error);
    println!("  Baseline error: {:.3}", report.baseline_error);
    println!("  Match: {}", if report.is_match { "yes" } else { "no" });
    println!("  Processing Time: {:.3}ms", report.processing_time_ms);
    println!();
}

pub fn print_ranking(ranked: &[RankedMatch]) {
    println!("| Pose | Name | Pairs | Scale | Rotation (°) | Normalized error | Match |");
    println!("|------|------|-------|-------|--------------|------------------|-------|");

    for entry in ranked {
        let r = &entry.report;
        println!("| {} | {} | {} | {:.3} | {:.2} | {:.4} | {} |",
                 entry.pose_id,
                 entry.name,
                 r.correspondence_count,
                 r.scale,
                 r.signed_rotation_degrees,
                 r.normalized_error,
                 if r.is_match { "yes" } else { "no" });
    }
}
