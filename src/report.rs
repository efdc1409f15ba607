use std::fmt::Write;

use pinjoint::{Analysis, FailureMode};

/// Render the member forces, failure checks and support reactions as text.
///
/// Positive forces are tensile. Every member line states whether the member
/// fails, followed by the governing mechanism when it does.
#[must_use]
pub fn render_report(analysis: &Analysis) -> String {
    let report = analysis.report();
    let mut output = String::new();

    writeln!(
        &mut output,
        "Truss analysis ({} joints, {} members, {} unknowns)",
        analysis.truss().joint_count(),
        report.members.len(),
        report.unknown_forces.len()
    )
    .expect("writing to string cannot fail");

    for member in &report.members {
        write!(
            &mut output,
            "member {} force = {:+.4e} N; fails: {}",
            member.name, member.force, member.failed
        )
        .expect("writing to string cannot fail");
        match (member.failure_mode, member.factor_of_safety) {
            (Some(FailureMode::Buckling), _) => output.push_str(" (buckling)"),
            (Some(FailureMode::Yielding), _) => output.push_str(" (yielding)"),
            (None, Some(fos)) => {
                write!(&mut output, " (factor of safety {fos:.2})")
                    .expect("writing to string cannot fail");
            }
            (None, None) => {}
        }
        output.push('\n');
    }

    for reaction in &report.reactions {
        let components = reaction
            .components
            .iter()
            .map(|component| format!("{component:+.4e}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            &mut output,
            "reaction at {} ({}) = [{}] N",
            reaction.node, reaction.support, components
        )
        .expect("writing to string cannot fail");
    }

    let failures = report.failures.iter().filter(|failed| **failed).count();
    if failures == 0 {
        output.push_str("All members hold.\n");
    } else {
        writeln!(&mut output, "{failures} member(s) fail.")
            .expect("writing to string cannot fail");
    }

    output
}
