//! Concrete end-to-end scenarios (spec.md §8).

use constraint_solver_core::{
    Constraint, ConstraintSpec, LoadError, Point, Primitive, PrimitiveId, Session, SolveStatus,
};

fn point(id: &str, x: f64, y: f64, fixed: bool) -> Primitive {
    Primitive::Point(Point::new(id, x, y, fixed))
}

fn line(id: &str, p1: &str, p2: &str) -> Primitive {
    Primitive::Line(constraint_solver_core::Line {
        id: PrimitiveId::new(id),
        p1_id: PrimitiveId::new(p1),
        p2_id: PrimitiveId::new(p2),
    })
}

fn distance(id: &str, p1: &str, p2: &str, value: f64) -> Primitive {
    Primitive::Constraint(Constraint {
        id: PrimitiveId::new(id),
        kind: ConstraintSpec::Distance {
            p1: PrimitiveId::new(p1),
            p2: PrimitiveId::new(p2),
            value,
        },
    })
}

fn dist_xy((ax, ay): (f64, f64), (bx, by): (f64, f64)) -> f64 {
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

/// S1: fixed rectangle by four side-length constraints. Each edge must land
/// within 0.02 of the target 500.
#[test]
fn s1_fixed_rectangle() {
    let primitives = vec![
        point("p1", 0.0, 0.0, true),
        point("p2", 500.0, 0.0, false),
        point("p3", 500.0, 500.0, false),
        point("p4", 0.0, 500.0, false),
        distance("d12", "p1", "p2", 500.0),
        distance("d23", "p2", "p3", 500.0),
        distance("d34", "p3", "p4", 500.0),
        distance("d41", "p4", "p1", 500.0),
    ];

    let mut session = Session::new();
    session.load(primitives).unwrap();
    session.configure(constraint_solver_core::SolverConfig {
        max_iterations: 20_000,
        convergence_epsilon: 0.015,
        stall_error_threshold: 0.015,
        stall_patience: 20_000,
        ..Default::default()
    });
    let report = session.solve().unwrap();
    assert!(matches!(
        report.status,
        SolveStatus::Converged | SolveStatus::Success
    ));

    let p1 = session.point_coords(&PrimitiveId::new("p1")).unwrap();
    let p2 = session.point_coords(&PrimitiveId::new("p2")).unwrap();
    let p3 = session.point_coords(&PrimitiveId::new("p3")).unwrap();
    let p4 = session.point_coords(&PrimitiveId::new("p4")).unwrap();
    assert_eq!(p1, (0.0, 0.0));

    for (a, b) in [(p1, p2), (p2, p3), (p3, p4), (p4, p1)] {
        assert!(
            (dist_xy(a, b) - 500.0).abs() < 0.02,
            "edge length {} not within 0.02 of 500",
            dist_xy(a, b)
        );
    }
}

/// S2: perpendicular L-shape with six edge-length and four perpendicularity
/// constraints. Each edge must land within 0.05% of its target length, and
/// each perpendicular pair's normalized dot product must be below 0.001.
#[test]
fn s2_perpendicular_l_shape() {
    let coords = [
        ("p1", 0.0, 0.0, true),
        ("p2", 400.0, 50.0, false),
        ("p3", 350.0, 400.0, false),
        ("p4", 200.0, 350.0, false),
        ("p5", 150.0, 200.0, false),
        ("p6", -50.0, 250.0, false),
    ];
    let mut primitives: Vec<Primitive> = coords
        .iter()
        .map(|(id, x, y, fixed)| point(id, *x, *y, *fixed))
        .collect();

    let edges = [
        ("l1", "p1", "p2", 400.0),
        ("l2", "p2", "p3", 300.0),
        ("l3", "p3", "p4", 200.0),
        ("l4", "p4", "p5", 200.0),
        ("l5", "p5", "p6", 200.0),
        ("l6", "p6", "p1", 500.0),
    ];
    for (id, p1, p2, _) in &edges {
        primitives.push(line(id, p1, p2));
    }
    for (idx, (id, _, _, len)) in edges.iter().enumerate() {
        let line_id = edges[idx].0;
        primitives.push(Primitive::Constraint(Constraint {
            id: PrimitiveId::new(format!("len_{}", id)),
            kind: ConstraintSpec::LineLength {
                line: PrimitiveId::new(line_id),
                value: *len,
            },
        }));
    }
    for (idx, (a, b)) in [("l1", "l2"), ("l2", "l3"), ("l3", "l4"), ("l5", "l6")]
        .iter()
        .enumerate()
    {
        primitives.push(Primitive::Constraint(Constraint {
            id: PrimitiveId::new(format!("perp_{}", idx)),
            kind: ConstraintSpec::Perpendicular {
                line1: PrimitiveId::new(*a),
                line2: PrimitiveId::new(*b),
            },
        }));
    }

    let mut session = Session::new();
    session.load(primitives).unwrap();
    let config = constraint_solver_core::SolverConfig {
        max_iterations: 20_000,
        convergence_epsilon: 0.05,
        stall_error_threshold: 0.05,
        stall_patience: 20_000,
        ..Default::default()
    };
    session.configure(config);
    let report = session.solve().unwrap();
    assert!(
        matches!(report.status, SolveStatus::Converged | SolveStatus::Success),
        "status = {:?}, error = {}",
        report.status,
        report.final_error
    );

    for (_, p1, p2, target) in &edges {
        let a = session.point_coords(&PrimitiveId::new(*p1)).unwrap();
        let b = session.point_coords(&PrimitiveId::new(*p2)).unwrap();
        let len = dist_xy(a, b);
        assert!(
            (len - target).abs() < target * 0.0005,
            "edge {}-{}: {} vs {} (not within 0.05%)",
            p1,
            p2,
            len,
            target
        );
    }

    let line_points: std::collections::HashMap<&str, (&str, &str)> =
        edges.iter().map(|(id, p1, p2, _)| (*id, (*p1, *p2))).collect();
    for (l1, l2) in [("l1", "l2"), ("l2", "l3"), ("l3", "l4"), ("l5", "l6")] {
        let (a1, a2) = line_points[l1];
        let (b1, b2) = line_points[l2];
        let pa1 = session.point_coords(&PrimitiveId::new(a1)).unwrap();
        let pa2 = session.point_coords(&PrimitiveId::new(a2)).unwrap();
        let pb1 = session.point_coords(&PrimitiveId::new(b1)).unwrap();
        let pb2 = session.point_coords(&PrimitiveId::new(b2)).unwrap();
        let v1 = (pa2.0 - pa1.0, pa2.1 - pa1.1);
        let v2 = (pb2.0 - pb1.0, pb2.1 - pb1.1);
        let dot = v1.0 * v2.0 + v1.1 * v2.1;
        let len1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
        let len2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
        let ratio = dot.abs() / (len1 * len2);
        assert!(
            ratio < 0.001,
            "{}-{} not perpendicular enough: ratio = {}",
            l1,
            l2,
            ratio
        );
    }
}

/// S3: coincident constraint pulls two distinct points together, to within
/// 0.1.
#[test]
fn s3_coincident() {
    let primitives = vec![
        point("p1", 10.0, 10.0, false),
        point("p2", 20.0, 20.0, false),
        Primitive::Constraint(Constraint {
            id: PrimitiveId::new("c1"),
            kind: ConstraintSpec::Coincident {
                p1: PrimitiveId::new("p1"),
                p2: PrimitiveId::new("p2"),
            },
        }),
    ];

    let mut session = Session::new();
    session.load(primitives).unwrap();
    session.configure(constraint_solver_core::SolverConfig {
        max_iterations: 5_000,
        convergence_epsilon: 0.05,
        stall_error_threshold: 0.05,
        stall_patience: 5_000,
        ..Default::default()
    });
    let report = session.solve().unwrap();
    assert!(matches!(
        report.status,
        SolveStatus::Converged | SolveStatus::Success
    ));

    let a = session.point_coords(&PrimitiveId::new("p1")).unwrap();
    let b = session.point_coords(&PrimitiveId::new("p2")).unwrap();
    assert!(dist_xy(a, b) < 0.1, "gap {} not within 0.1", dist_xy(a, b));
}

/// S4: triangle defined by its three side lengths, each within 0.05 of its
/// target.
#[test]
fn s4_triangle_by_three_sides() {
    let primitives = vec![
        point("p1", 0.0, 0.0, true),
        point("p2", 90.0, 10.0, false),
        point("p3", 20.0, 70.0, false),
        distance("d12", "p1", "p2", 100.0),
        distance("d23", "p2", "p3", 60.0),
        distance("d31", "p3", "p1", 80.0),
    ];

    let mut session = Session::new();
    session.load(primitives).unwrap();
    session.configure(constraint_solver_core::SolverConfig {
        max_iterations: 20_000,
        convergence_epsilon: 0.04,
        stall_error_threshold: 0.04,
        stall_patience: 20_000,
        ..Default::default()
    });
    let report = session.solve().unwrap();
    assert!(matches!(
        report.status,
        SolveStatus::Converged | SolveStatus::Success
    ));

    let p1 = session.point_coords(&PrimitiveId::new("p1")).unwrap();
    let p2 = session.point_coords(&PrimitiveId::new("p2")).unwrap();
    let p3 = session.point_coords(&PrimitiveId::new("p3")).unwrap();

    assert!((dist_xy(p1, p2) - 100.0).abs() < 0.05);
    assert!((dist_xy(p2, p3) - 60.0).abs() < 0.05);
    assert!((dist_xy(p3, p1) - 80.0).abs() < 0.05);
}

/// S5: over-constrained rectangle with an inconsistent diagonal. Must
/// report Failed, keep finite coordinates, and surface the diagonal in the
/// diagnostic report's worst residuals.
#[test]
fn s5_over_constrained_reports_failure() {
    let primitives = vec![
        point("p1", 0.0, 0.0, true),
        point("p2", 500.0, 0.0, false),
        point("p3", 500.0, 500.0, false),
        point("p4", 0.0, 500.0, false),
        distance("d12", "p1", "p2", 500.0),
        distance("d23", "p2", "p3", 500.0),
        distance("d34", "p3", "p4", 500.0),
        distance("d41", "p4", "p1", 500.0),
        distance("diagonal", "p1", "p3", 100.0),
    ];

    let mut session = Session::new();
    session.load(primitives).unwrap();
    let config = constraint_solver_core::SolverConfig {
        stall_patience: 50,
        ..Default::default()
    };
    session.configure(config);
    let report = session.solve().unwrap();
    assert_eq!(report.status, SolveStatus::Failed);
    assert!(report.final_error.is_finite());

    for id in ["p1", "p2", "p3", "p4"] {
        let (x, y) = session.point_coords(&PrimitiveId::new(id)).unwrap();
        assert!(x.is_finite() && y.is_finite());
    }

    let diagnostics = session.diagnostics().unwrap();
    assert!(diagnostics
        .worst
        .iter()
        .any(|entry| entry.constraint_id == PrimitiveId::new("diagonal")));
}

/// Property 6: applying a horizontal constraint to points already aligned
/// leaves them within tolerance, i.e. it doesn't perturb a satisfied system.
#[test]
fn property_6_horizontal_idempotence() {
    let primitives = vec![
        point("p1", 0.0, 12.0, false),
        point("p2", 40.0, 12.0, false),
        Primitive::Constraint(Constraint {
            id: PrimitiveId::new("h1"),
            kind: ConstraintSpec::Horizontal {
                p1: PrimitiveId::new("p1"),
                p2: PrimitiveId::new("p2"),
            },
        }),
    ];

    let mut session = Session::new();
    session.load(primitives).unwrap();
    session.solve();

    let a = session.point_coords(&PrimitiveId::new("p1")).unwrap();
    let b = session.point_coords(&PrimitiveId::new("p2")).unwrap();
    assert!((b.1 - a.1).abs() < 0.1);
}

/// S6: a constraint referencing a nonexistent point fails the whole load
/// atomically; no session state is retained afterward.
#[test]
fn s6_bad_reference_rejected_atomically() {
    let primitives = vec![
        point("p1", 0.0, 0.0, true),
        point("p2", 10.0, 0.0, false),
        distance("d1", "p1", "ghost", 5.0),
    ];

    let mut session = Session::new();
    let err = session.load(primitives).unwrap_err();
    assert_eq!(
        err,
        LoadError::BadReference {
            referrer: PrimitiveId::new("d1"),
            missing_id: PrimitiveId::new("ghost"),
        }
    );
    assert!(!session.is_loaded());
}
