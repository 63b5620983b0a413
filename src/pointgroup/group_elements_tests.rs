use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::geometry::proper_rotation_matrix;
use crate::pointgroup::group_elements::{
    close_group, dihedral_group_elements, generate_group_elements, generators_from_axes,
    select_recommended_d_pair, GroupElementOutcome, MAX_GROUP_ELEMENTS,
};
use crate::pointgroup::{AxisDescriptor, PointGroupKind, SymmetryAxisCandidate};

const TOL: f64 = 0.1;

fn golden() -> f64 {
    0.5 * (1.0 + 5.0f64.sqrt())
}

fn complete(outcome: GroupElementOutcome) -> crate::pointgroup::group_elements::GroupElementSet {
    match outcome {
        GroupElementOutcome::Complete(set) => set,
        GroupElementOutcome::Degenerate { reason, .. } => panic!("Unexpected degeneracy: {reason}"),
    }
}

#[test]
fn test_cyclic_group_elements() {
    for n in 2..=9u32 {
        let kind = PointGroupKind::Cyclic(n);
        let axis = Vector3::new(0.3, -0.2, 0.9).normalize();
        let generators = generators_from_axes(&kind, &axis, None).unwrap();
        let set = complete(generate_group_elements(&kind, &generators, TOL, 10));
        assert_eq!(set.len(), n as usize);
        assert_relative_eq!(set.elements()[0], Matrix3::identity());
        assert_relative_eq!(set.elements()[1], generators[0], epsilon = 1e-12);
        assert!(set.is_closed(TOL));
        let axes = set.rotation_axes(60);
        assert_eq!(axes.len(), 1);
        assert_eq!(axes[0].1, n);
        assert_relative_eq!(axes[0].0, axis, epsilon = 1e-9);
    }
    let (trivial, closed) = close_group(&[Matrix3::identity()], TOL, 10);
    assert!(closed);
    assert_eq!(trivial.len(), 1);
}

#[test]
fn test_dihedral_group_elements() {
    for n in 2..=8u32 {
        let kind = PointGroupKind::Dihedral(n);
        let generators = generators_from_axes(&kind, &Vector3::z(), Some(&Vector3::x())).unwrap();
        let set = complete(generate_group_elements(&kind, &generators, TOL, 10));
        assert_eq!(set.len(), 2 * n as usize);
        assert!(set.is_closed(TOL));
        let axes = set.rotation_axes(60);
        assert_eq!(axes.len(), n as usize + 1);
        if n > 2 {
            assert_eq!(axes[0].1, n);
            assert_relative_eq!(axes[0].0, Vector3::z(), epsilon = 1e-9);
            assert!(axes[1..].iter().all(|(_, order)| *order == 2));
        }
    }
    assert!(generators_from_axes(&PointGroupKind::Dihedral(3), &Vector3::z(), None).is_none());
}

#[test]
fn test_polyhedral_group_elements() {
    let c3 = Vector3::new(1.0, 1.0, 1.0).normalize();

    let t = PointGroupKind::Tetrahedral;
    let generators =
        generators_from_axes(&t, &c3, Some(&Vector3::new(1.0, -1.0, -1.0).normalize())).unwrap();
    let set = complete(generate_group_elements(&t, &generators, TOL, 10));
    assert_eq!(set.len(), 12);
    let axes = set.rotation_axes(60);
    assert_eq!(axes.len(), 7);
    assert_eq!(axes.iter().filter(|(_, order)| *order == 3).count(), 4);

    let o = PointGroupKind::Octahedral;
    let generators = generators_from_axes(&o, &Vector3::z(), Some(&c3)).unwrap();
    let set = complete(generate_group_elements(&o, &generators, TOL, 10));
    assert_eq!(set.len(), 24);
    let axes = set.rotation_axes(60);
    assert_eq!(axes.len(), 13);
    assert_eq!(axes.iter().filter(|(_, order)| *order == 4).count(), 3);

    let i = PointGroupKind::Icosahedral;
    let c5 = Vector3::new(0.0, 1.0, golden()).normalize();
    assert_relative_eq!(c5.dot(&c3), 0.7947, epsilon = 1e-4);
    let generators = generators_from_axes(&i, &c5, Some(&c3)).unwrap();
    let set = complete(generate_group_elements(&i, &generators, TOL, 10));
    assert_eq!(set.len(), 60);
    assert!(set.is_closed(TOL));
    let axes = set.rotation_axes(60);
    assert_eq!(axes.len(), 31);
    assert_eq!(axes.iter().filter(|(_, order)| *order == 5).count(), 6);
    assert_eq!(axes.iter().filter(|(_, order)| *order == 3).count(), 10);
    assert_eq!(axes.iter().filter(|(_, order)| *order == 2).count(), 15);
}

#[test]
fn test_degenerate_generators() {
    let kind = PointGroupKind::Octahedral;
    let tilted = Vector3::new(0.5, 0.0, 3.0f64.sqrt() / 2.0);
    let generators = vec![
        proper_rotation_matrix(PI / 2.0, &Vector3::z(), 1),
        proper_rotation_matrix(PI / 2.0, &tilted, 1),
    ];
    match generate_group_elements(&kind, &generators, TOL, 10) {
        GroupElementOutcome::Degenerate { partial, .. } => {
            assert!(partial.len() > 24);
            assert!(partial.len() <= MAX_GROUP_ELEMENTS + 1);
            assert_relative_eq!(partial.elements()[0], Matrix3::identity());
        }
        GroupElementOutcome::Complete(_) => panic!("An infinite group cannot be complete."),
    }

    let c2 = proper_rotation_matrix(PI, &Vector3::z(), 1);
    let outcome = generate_group_elements(&PointGroupKind::Cyclic(4), &[c2], TOL, 10);
    assert!(outcome.complete().is_none());
    assert_eq!(outcome.elements().len(), 2);
}

#[test]
fn test_row_major_export() {
    let kind = PointGroupKind::Cyclic(4);
    let generators = generators_from_axes(&kind, &Vector3::z(), None).unwrap();
    let set = complete(generate_group_elements(&kind, &generators, TOL, 10));
    let rows = set.to_row_major();
    assert_eq!(rows.len(), 4);
    let expected = [0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
    for (value, reference) in rows[1].iter().zip(expected.iter()) {
        assert_relative_eq!(*value, *reference, epsilon = 1e-12);
    }
}

#[test]
fn test_select_recommended_d_pair() {
    let all_cs = vec![
        SymmetryAxisCandidate { fold: 3, axis: Vector3::z(), height: 0.9 },
        SymmetryAxisCandidate {
            fold: 2,
            axis: Vector3::new(1.0, 0.0, 0.03).normalize(),
            height: 0.8,
        },
        SymmetryAxisCandidate { fold: 2, axis: Vector3::y(), height: 0.7 },
        SymmetryAxisCandidate { fold: 2, axis: Vector3::new(1.0, 0.0, 1.0).normalize(), height: 0.6 },
    ];
    let d_pairs = vec![[0, 1], [0, 2]];
    let recommended = vec![
        AxisDescriptor::from(&all_cs[0]),
        AxisDescriptor::from(&SymmetryAxisCandidate {
            fold: 2,
            axis: Vector3::new(0.01, 1.0, 0.0).normalize(),
            height: 0.7,
        }),
    ];
    assert_eq!(select_recommended_d_pair(&all_cs, &d_pairs, &recommended, TOL), Some([0, 2]));
    assert_eq!(select_recommended_d_pair(&all_cs, &d_pairs, &recommended[..1], TOL), None);
    let unrelated = vec![recommended[0].clone(), AxisDescriptor::from(&all_cs[3])];
    assert_eq!(select_recommended_d_pair(&all_cs, &d_pairs, &unrelated, TOL), None);

    let set = complete(dihedral_group_elements(&all_cs, [0, 1], TOL, 10));
    assert_eq!(set.len(), 6);
    assert!(set.is_closed(1e-9));

    let skewed = dihedral_group_elements(&all_cs, [0, 3], TOL, 10);
    assert!(matches!(skewed, GroupElementOutcome::Degenerate { .. }));
    assert!(matches!(
        dihedral_group_elements(&all_cs, [0, 9], TOL, 10),
        GroupElementOutcome::Degenerate { .. }
    ));
}
