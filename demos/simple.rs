use pinjoint::{point, ShapeTag, Support, SupportKind, Truss};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut truss = Truss::new();
    truss.add_node("A", Support::Fixed, point(0.0, 0.0))?;
    truss.add_node("B", Support::new(SupportKind::Loose, 0.0), point(2.0, 0.0))?;
    truss.add_node("C", Support::Free, point(1.0, 1.0))?;
    truss.add_member("A", "B", ShapeTag::O, &[0.05, 0.005], 200.0e9, 250.0e6)?;
    truss.add_member("B", "C", ShapeTag::O, &[0.05, 0.005], 200.0e9, 250.0e6)?;
    truss.add_member("A", "C", ShapeTag::O, &[0.05, 0.005], 200.0e9, 250.0e6)?;
    truss.add_force("C", 1000.0, 270.0)?;

    let analysis = truss.solve()?;

    for member in analysis.truss().members() {
        let label = analysis.truss().member_label(member.index()).unwrap_or_default();
        if let Some(force) = member.axial_force() {
            println!("{label}: {force:+.1} N");
        }
    }

    Ok(())
}
