use approx::assert_abs_diff_eq;
use fixed_bepuphysics::physics::constraints::contact::{ContactData, ContactManifoldConstraint};
use fixed_bepuphysics::physics::constraints::rigidity_settings::RigiditySettings;
use fixed_bepuphysics::physics::constraints::{BallSocketJoint, MaximumAngularSpeedConstraint, SolverUpdateable};
use fixed_bepuphysics::physics::inertia_helper::InertiaHelper;
use fixed_bepuphysics::physics::materials::MaterialManager;
use fixed_bepuphysics::physics::{PoseIntegrator, TimeStepper};
use fixed_bepuphysics::utilities::math_helper::{from_int, ratio, HALF, ONE, ZERO};
use fixed_bepuphysics::utilities::{Matrix3x3, Vector3};
use fixed_bepuphysics::{ConstraintHandle, Entities, Entity, EntityHandle, Real, Settings, Solver};

const CORNERS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

fn dt() -> Real {
    ratio(1, 60)
}

fn unit_box(entities: &mut Entities, position: Vector3) -> EntityHandle {
    let inertia = InertiaHelper::box_tensor(ONE, ONE, ONE, ONE);
    entities.add(Entity::new_dynamic(position, ONE, inertia).unwrap())
}

fn manifold(
    solver: &mut Solver,
    entities: &Entities,
    a: EntityHandle,
    b: EntityHandle,
) -> ConstraintHandle {
    let mut manifold = ContactManifoldConstraint::new();
    manifold
        .setup(entities, &MaterialManager::new(), Some(a), Some(b))
        .unwrap();
    solver.add(manifold)
}

/// Reports the four bottom corners of the unit box `upper` resting on the flat top of `lower`,
/// whose surface lies `surface_offset` above its center.
fn detect_box_contacts(
    solver: &mut Solver,
    entities: &Entities,
    settings: &Settings,
    handle: ConstraintHandle,
    lower: EntityHandle,
    upper: EntityHandle,
    surface_offset: Real,
) {
    let surface = entities.get(lower).unwrap().position().y + surface_offset;
    let center = entities.get(upper).unwrap().position();
    let bottom = center.y - HALF;
    let manifold = solver.get_as_mut::<ContactManifoldConstraint>(handle).unwrap();
    for (id, (x, z)) in CORNERS.iter().enumerate() {
        let position = Vector3::new(center.x + HALF * from_int(*x), bottom, center.z + HALF * from_int(*z));
        let data = ContactData::new(position, Vector3::UNIT_Y, surface - bottom, id as u32);
        manifold.add_contact(entities, settings, &data);
    }
}

#[test]
fn box_comes_to_rest_on_platform() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let platform = entities.add(Entity::new_kinematic(Vector3::ZERO));
    let body = unit_box(&mut entities, Vector3::new(ZERO, HALF, ZERO));
    let mut solver = Solver::new();
    let contacts = manifold(&mut solver, &entities, platform, body);
    let mut stepper = TimeStepper::new();
    let integrator = PoseIntegrator::default();

    for _ in 0..600 {
        detect_box_contacts(&mut solver, &entities, &settings, contacts, platform, body, ZERO);
        stepper.step(&mut entities, &mut solver, &integrator, &settings, dt());
    }

    let allowed = settings.collision_detection.allowed_penetration().to_num::<f64>();
    let body = entities.get(body).unwrap();
    assert_abs_diff_eq!(body.position().y.to_num::<f64>(), 0.5, epsilon = allowed + 0.005);
    assert_abs_diff_eq!(body.linear_velocity().y.to_num::<f64>(), 0.0, epsilon = 0.02);
    assert_abs_diff_eq!(body.position().x.to_num::<f64>(), 0.0, epsilon = 1e-2);
    assert_abs_diff_eq!(body.position().z.to_num::<f64>(), 0.0, epsilon = 1e-2);
}

#[test]
fn two_box_stack_settles() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let platform = entities.add(Entity::new_kinematic(Vector3::ZERO));
    let lower = unit_box(&mut entities, Vector3::new(ZERO, HALF, ZERO));
    let upper = unit_box(&mut entities, Vector3::new(ZERO, ratio(3, 2), ZERO));
    let mut solver = Solver::new();
    let ground_contacts = manifold(&mut solver, &entities, platform, lower);
    let stack_contacts = manifold(&mut solver, &entities, lower, upper);
    let mut stepper = TimeStepper::new();
    let integrator = PoseIntegrator::default();

    for _ in 0..600 {
        detect_box_contacts(&mut solver, &entities, &settings, ground_contacts, platform, lower, ZERO);
        detect_box_contacts(&mut solver, &entities, &settings, stack_contacts, lower, upper, HALF);
        stepper.step(&mut entities, &mut solver, &integrator, &settings, dt());
    }

    let allowed = settings.collision_detection.allowed_penetration().to_num::<f64>();
    let lower_y = entities.get(lower).unwrap().position().y.to_num::<f64>();
    let upper_y = entities.get(upper).unwrap().position().y.to_num::<f64>();
    assert_abs_diff_eq!(lower_y, 0.5, epsilon = allowed + 0.005);
    assert_abs_diff_eq!(upper_y - lower_y, 1.0, epsilon = allowed + 0.005);
    for handle in [lower, upper] {
        let velocity = entities.get(handle).unwrap().linear_velocity();
        assert_abs_diff_eq!(velocity.y.to_num::<f64>(), 0.0, epsilon = 0.02);
    }
}

#[test]
fn rigid_ball_socket_keeps_anchors_together() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let a = entities.add(
        Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
            .unwrap()
            .with_velocity(-Vector3::UNIT_X, Vector3::ZERO),
    );
    let b = entities.add(
        Entity::new_dynamic(Vector3::from_ints(2, 0, 0), ONE, Matrix3x3::IDENTITY)
            .unwrap()
            .with_velocity(Vector3::UNIT_X, Vector3::UNIT_Y),
    );
    let mut joint = BallSocketJoint::new(&entities, Some(a), Some(b), Vector3::UNIT_X).unwrap();
    joint.rigidity_settings = RigiditySettings::new(from_int(1_000_000)).unwrap();
    let mut solver = Solver::new();
    solver.add(joint);
    let mut stepper = TimeStepper::new();
    let integrator = PoseIntegrator::new(Vector3::ZERO);

    for _ in 0..30 {
        stepper.step(&mut entities, &mut solver, &integrator, &settings, dt());
        let a = entities.get(a).unwrap();
        let b = entities.get(b).unwrap();
        let anchor_a = a.pose.transform(Vector3::UNIT_X);
        let anchor_b = b.pose.transform(-Vector3::UNIT_X);
        let separation = (anchor_b - anchor_a).length().to_num::<f64>();
        assert!(separation < 0.01, "anchors separated by {separation}");
    }
}

#[test]
fn angular_speed_limit_holds_after_one_iteration() {
    let settings = Settings::default();
    let maximum = from_int(2);
    let mut entities = Entities::new();
    let spinner = entities.add(
        Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
            .unwrap()
            .with_velocity(Vector3::ZERO, Vector3::new(ZERO, ZERO, from_int(4))),
    );
    let mut solver = Solver::new();
    solver.add(MaximumAngularSpeedConstraint::new(&entities, spinner, maximum).unwrap());
    solver.set_iteration_limit(1).unwrap();
    solver.solve(&mut entities, &settings, dt());

    let speed = entities.get(spinner).unwrap().angular_velocity().length().to_num::<f64>();
    assert!(speed <= 2.0 * 1.01, "spinning at {speed}");
    assert!(speed > 1.9);
}

#[test]
fn falling_box_closes_speculative_gap() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let platform = entities.add(Entity::new_kinematic(Vector3::ZERO));
    let body = unit_box(&mut entities, Vector3::new(ZERO, ratio(11, 20), ZERO));
    entities.get_mut(body).unwrap().velocity.linear = Vector3::from_ints(0, -5, 0);
    let mut solver = Solver::new();
    let contacts = manifold(&mut solver, &entities, platform, body);
    detect_box_contacts(&mut solver, &entities, &settings, contacts, platform, body, ZERO);

    solver.solve(&mut entities, &settings, dt());

    // A 0.05 gap closes at 3 m/s over one step; softness lets a little more through.
    let velocity = entities.get(body).unwrap().linear_velocity().y.to_num::<f64>();
    assert!(velocity < -2.95, "falling at {velocity}");
    assert_abs_diff_eq!(velocity, -3.0, epsilon = 0.1);
}

#[test]
fn heavy_pendulum_with_large_impulse() {
    let settings = Settings::default();
    let mass = from_int(1000);
    let mut entities = Entities::new();
    let bob = entities.add(
        Entity::new_dynamic(Vector3::UNIT_X, mass, Matrix3x3::IDENTITY.scale(mass))
            .unwrap()
            .with_velocity(Vector3::from_ints(0, -200, 0), Vector3::ZERO),
    );
    let joint = BallSocketJoint::new(&entities, None, Some(bob), Vector3::ZERO).unwrap();
    let mut solver = Solver::new();
    let handle = solver.add(joint);

    solver.solve(&mut entities, &settings, dt());

    // Effective inverse mass along Y is 0.002 plus 0.0006 softness.
    let impulse = solver.get_as::<BallSocketJoint>(handle).unwrap().accumulated_impulse();
    assert!(impulse.length() > from_int(46_341));
    assert_abs_diff_eq!(impulse.y.to_num::<f64>(), 200.0 / 0.0026, epsilon = 500.0);
    let bob = entities.get(bob).unwrap();
    let anchor_velocity = bob.linear_velocity() + bob.angular_velocity().cross(-Vector3::UNIT_X);
    assert_abs_diff_eq!(anchor_velocity.y.to_num::<f64>(), -200.0 * 0.0006 / 0.0026, epsilon = 0.5);
}

fn pendulum(entities: &mut Entities, solver: &mut Solver, x: i32) -> (EntityHandle, ConstraintHandle) {
    let bob = entities.add(
        Entity::new_dynamic(Vector3::from_ints(x + 1, 0, 0), ONE, Matrix3x3::IDENTITY)
            .unwrap()
            .with_velocity(-Vector3::UNIT_Y, Vector3::ZERO),
    );
    let joint = BallSocketJoint::new(entities, None, Some(bob), Vector3::from_ints(x, 0, 0)).unwrap();
    (bob, solver.add(joint))
}

#[test]
fn warm_started_resolve_applies_almost_nothing() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let mut solver = Solver::new();
    let (bob, _) = pendulum(&mut entities, &mut solver, 0);
    let initial = entities.get(bob).unwrap().velocity;

    let first = solver.solve(&mut entities, &settings, dt());
    assert!(first.converged());
    let solved = entities.get(bob).unwrap().velocity;

    entities.get_mut(bob).unwrap().velocity = initial;
    let second = solver.solve(&mut entities, &settings, dt());
    assert!(second.converged());
    assert_eq!(second.iterations, 1);
    assert!(second.last_total_impulse < ratio(1, 10_000));
    let resolved = entities.get(bob).unwrap().velocity;
    assert_abs_diff_eq!(
        (resolved.linear - solved.linear).length().to_num::<f64>(),
        0.0,
        epsilon = 1e-4
    );
}

#[test]
fn reactivation_discards_accumulated_impulses() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let platform = entities.add(Entity::new_kinematic(Vector3::ZERO));
    let body = unit_box(&mut entities, Vector3::new(ZERO, ratio(49, 100), ZERO));
    entities.get_mut(body).unwrap().velocity.linear = Vector3::new(ONE, -ONE, ZERO);
    let mut solver = Solver::new();
    let contacts = manifold(&mut solver, &entities, platform, body);
    let (_, joint) = pendulum(&mut entities, &mut solver, 5);
    detect_box_contacts(&mut solver, &entities, &settings, contacts, platform, body, ZERO);
    solver.solve(&mut entities, &settings, dt());

    let manifold = solver.get_as::<ContactManifoldConstraint>(contacts).unwrap();
    assert!(manifold.total_normal_impulse() > ZERO);
    assert!(solver.get_as::<BallSocketJoint>(joint).unwrap().accumulated_impulse() != Vector3::ZERO);

    for handle in [contacts, joint] {
        let constraint = solver.get_mut(handle).unwrap();
        constraint.set_active(false);
        constraint.set_active(true);
    }
    let manifold = solver.get_as::<ContactManifoldConstraint>(contacts).unwrap();
    assert_eq!(manifold.total_normal_impulse(), ZERO);
    assert_eq!(manifold.sliding_friction().world_accumulated_impulse(), Vector3::ZERO);
    assert_eq!(manifold.twist_friction().accumulated_impulse(), ZERO);
    assert_eq!(
        solver.get_as::<BallSocketJoint>(joint).unwrap().accumulated_impulse(),
        Vector3::ZERO
    );
}

#[test]
fn kinematic_velocities_are_never_changed() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let platform = entities.add(
        Entity::new_kinematic(Vector3::ZERO).with_velocity(Vector3::UNIT_X, Vector3::UNIT_Y),
    );
    let body = unit_box(&mut entities, Vector3::new(ZERO, ratio(49, 100), ZERO));
    entities.get_mut(body).unwrap().velocity.linear = Vector3::from_ints(-2, -3, 0);
    let mut solver = Solver::new();
    let contacts = manifold(&mut solver, &entities, platform, body);
    let tether = unit_box(&mut entities, Vector3::from_ints(0, 3, 0));
    solver.add(BallSocketJoint::new(&entities, Some(platform), Some(tether), Vector3::from_ints(0, 2, 0)).unwrap());

    let integrator = PoseIntegrator::default();
    let mut stepper = TimeStepper::new();
    for _ in 0..10 {
        detect_box_contacts(&mut solver, &entities, &settings, contacts, platform, body, ZERO);
        integrator.apply_forces(&mut entities, dt());
        solver.solve(&mut entities, &settings, dt());
        let platform = entities.get(platform).unwrap();
        assert_eq!(platform.linear_velocity(), Vector3::UNIT_X);
        assert_eq!(platform.angular_velocity(), Vector3::UNIT_Y);
    }
    stepper.step(&mut entities, &mut solver, &integrator, &settings, dt());
    assert_eq!(entities.get(platform).unwrap().linear_velocity(), Vector3::UNIT_X);
}

#[test]
fn friction_stays_within_bounds_every_iteration() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let platform = entities.add(Entity::new_kinematic(Vector3::ZERO));
    let body = unit_box(&mut entities, Vector3::new(ZERO, ratio(49, 100), ZERO));
    entities.get_mut(body).unwrap().velocity = fixed_bepuphysics::physics::body_properties::BodyVelocity::new(
        Vector3::from_ints(3, -1, 0),
        Vector3::from_ints(0, 4, 0),
    );
    let mut solver = Solver::new();
    let contacts = manifold(&mut solver, &entities, platform, body);
    detect_box_contacts(&mut solver, &entities, &settings, contacts, platform, body, ZERO);
    solver.update(&entities, &settings, dt());
    solver.warm_start(&mut entities);

    let tolerance = ratio(1, 1_000_000);
    let manifold = solver.get_as_mut::<ContactManifoldConstraint>(contacts).unwrap();
    for _ in 0..10 {
        manifold.solve_velocity_iteration(&mut entities);

        let normal_total = manifold.total_normal_impulse();
        let sliding = manifold.sliding_friction();
        let sliding_bound = sliding.friction() * normal_total;
        assert!(sliding.accumulated_impulse().length() <= sliding_bound + tolerance);

        let center = sliding.manifold_center();
        let twist_bound = manifold
            .penetration_constraints()
            .iter()
            .fold(ZERO, |sum, constraint| {
                sum + constraint.contact.position.distance(center) * constraint.accumulated_impulse()
            })
            * manifold.twist_friction().friction();
        assert!(manifold.twist_friction().accumulated_impulse().abs() <= twist_bound + tolerance);
    }
    assert!(manifold.total_normal_impulse() > ZERO);
    assert!(manifold.sliding_friction().accumulated_impulse().length() > ZERO);
}

#[test]
fn parallel_islands_match_isolated_serial_solves() {
    let settings = Settings::default();
    let mut entities = Entities::new();
    let mut solver = Solver::new();
    let (first_bob, _) = pendulum(&mut entities, &mut solver, 0);
    let (second_bob, _) = pendulum(&mut entities, &mut solver, 10);
    let first_link = unit_box(&mut entities, Vector3::from_ints(2, 0, 0));
    solver.add(BallSocketJoint::new(&entities, Some(first_bob), Some(first_link), Vector3::from_ints(2, 0, 0)).unwrap());
    entities.get_mut(second_bob).unwrap().velocity.angular = Vector3::UNIT_Z;

    let mut isolated_entities = entities.clone();
    let mut first_island = Solver::new();
    first_island.add(BallSocketJoint::new(&isolated_entities, None, Some(first_bob), Vector3::ZERO).unwrap());
    first_island.add(
        BallSocketJoint::new(&isolated_entities, Some(first_bob), Some(first_link), Vector3::from_ints(2, 0, 0))
            .unwrap(),
    );
    let mut second_island = Solver::new();
    second_island.add(
        BallSocketJoint::new(&isolated_entities, None, Some(second_bob), Vector3::from_ints(10, 0, 0)).unwrap(),
    );

    let report = solver.solve_islands_parallel(&mut entities, &settings, dt());
    let first_report = first_island.solve(&mut isolated_entities, &settings, dt());
    let second_report = second_island.solve(&mut isolated_entities, &settings, dt());

    for handle in [first_bob, first_link, second_bob] {
        assert_eq!(
            entities.get(handle).unwrap().velocity,
            isolated_entities.get(handle).unwrap().velocity
        );
    }
    assert_eq!(report.iterations, first_report.iterations.max(second_report.iterations));
}
