use pinjoint::{point, ShapeTag, Support, Truss};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two bars carrying a hanging load back to a wall
    let mut truss = Truss::new();

    // Define joints; both wall joints are pinned
    truss.add_node("A", Support::Fixed, point(0.0, 0.0))?;
    truss.add_node("B", Support::Fixed, point(0.0, 1.0))?;
    truss.add_node("C", Support::Free, point(1.5, 0.0))?;

    // The lower bar is pushed, the upper bar is pulled
    let strut = truss.add_member("A", "C", ShapeTag::C, &[0.04, 0.08, 0.004], 210.0e9, 250.0e6)?;
    let tie = truss.add_member("B", "C", ShapeTag::T, &[0.05, 0.05, 0.005], 210.0e9, 250.0e6)?;
    truss.add_force("C", 5_000.0, 270.0)?;

    let analysis = truss.solve()?;

    // Retrieve and print the factor of safety for each bar
    for (name, member) in [("strut", strut), ("tie", tie)] {
        match analysis.member(member).and_then(|member| member.factor_of_safety()) {
            Some(factor_of_safety) => println!("{name} factor of safety: {factor_of_safety:.2}"),
            None => println!("Factor of safety is unavailable for the {name}."),
        }
    }

    Ok(())
}
