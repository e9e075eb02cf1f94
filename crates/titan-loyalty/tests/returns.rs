//! End-to-end checks of point awards for purchases and returns.

use titan_loyalty::{
    points_for_programs, AppliesOn, CalculationContext, OrderLine, PointsCalculation, Program,
    ProgramType, RewardPointMode, RewardProgram, RewardRef, RewardType, Rule,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn line(id: &str, product: &str, qty: f64, price_with_tax: f64) -> OrderLine {
    OrderLine {
        id: id.to_string(),
        product_id: Some(product.to_string()),
        quantity: qty,
        price_with_tax,
        price_without_tax: price_with_tax,
        ..Default::default()
    }
}

fn single_rule_program(mode: RewardPointMode, amount: f64) -> Program {
    Program {
        id: "loyalty".to_string(),
        rules: vec![Rule {
            id: "rule".to_string(),
            valid_product_ids: ["mug".to_string()].into_iter().collect(),
            reward_point_mode: mode,
            reward_point_amount: amount,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn calculate(lines: &[OrderLine], programs: &[Program]) -> PointsCalculation {
    init_tracing();
    points_for_programs(lines, programs, &CalculationContext::default()).unwrap()
}

fn points(result: &PointsCalculation, program_id: &str) -> Vec<f64> {
    result
        .awards_for(program_id)
        .unwrap()
        .iter()
        .map(|a| a.points.to_f64())
        .collect()
}

#[test]
fn test_unit_return_example() {
    let result = calculate(
        &[line("L1", "mug", -3.0, -36.0)],
        &[single_rule_program(RewardPointMode::Unit, 10.0)],
    );
    assert_eq!(points(&result, "loyalty"), vec![-30.0]);
}

#[test]
fn test_split_money_example() {
    let mut program = single_rule_program(RewardPointMode::Money, 0.1);
    program.applies_on = AppliesOn::Future;
    program.rules[0].reward_point_split = true;

    let result = calculate(&[line("L1", "mug", 2.0, 20.0)], &[program]);
    assert_eq!(points(&result, "loyalty"), vec![1.0, 1.0]);
}

#[test]
fn test_split_money_return_keeps_formula_sign() {
    let mut program = single_rule_program(RewardPointMode::Money, 0.1);
    program.applies_on = AppliesOn::Future;
    program.rules[0].reward_point_split = true;

    // 0.1 × -20 / |-2| × sign(-2) = +1.0 per unit
    let result = calculate(&[line("L1", "mug", -2.0, -20.0)], &[program]);
    assert_eq!(points(&result, "loyalty"), vec![1.0, 1.0]);
}

#[test]
fn test_sign_symmetry_for_quantity_and_money_modes() {
    for (mode, amount) in [(RewardPointMode::Unit, 3.0), (RewardPointMode::Money, 0.15)] {
        let programs = [single_rule_program(mode, amount)];
        let bought = calculate(&[line("L1", "mug", 4.0, 33.33)], &programs);
        let returned = calculate(&[line("L1", "mug", -4.0, -33.33)], &programs);

        let p = bought.total_points("loyalty");
        assert!(!p.is_zero(), "{:?} earned nothing", mode);
        assert_eq!(returned.total_points("loyalty"), -p, "{:?} is not symmetric", mode);
    }
}

#[test]
fn test_order_mode_bonus_is_not_reversed() {
    let programs = [single_rule_program(RewardPointMode::Order, 50.0)];
    let returned = calculate(&[line("L1", "mug", -1.0, -10.0)], &programs);
    assert_eq!(points(&returned, "loyalty"), vec![50.0]);
}

#[test]
fn test_minimum_amount_gate_on_net_return() {
    let mut program = single_rule_program(RewardPointMode::Unit, 1.0);
    program.rules[0].minimum_amount = 40.0;

    let result = calculate(&[line("L1", "mug", -5.0, -50.0)], &[program]);
    assert_eq!(points(&result, "loyalty"), vec![-5.0]);
}

#[test]
fn test_split_unit_count_is_never_negative() {
    let mut program = single_rule_program(RewardPointMode::Unit, 2.0);
    program.applies_on = AppliesOn::Future;
    program.rules[0].reward_point_split = true;

    let result = calculate(&[line("L1", "mug", -4.0, -40.0)], &[program]);
    assert_eq!(points(&result, "loyalty"), vec![-2.0; 4]);
}

#[test]
fn test_coupons_always_get_a_slot() {
    let mut coupons = single_rule_program(RewardPointMode::Unit, 1.0);
    coupons.id = "coupons".to_string();
    coupons.program_type = ProgramType::Coupons;
    let plain = Program {
        id: "plain".to_string(),
        ..single_rule_program(RewardPointMode::Unit, 1.0)
    };

    // Nothing in the order matches either program
    let result = calculate(&[line("L1", "tea", 1.0, 5.0)], &[coupons, plain]);
    assert_eq!(points(&result, "coupons"), vec![0.0]);
    assert!(points(&result, "plain").is_empty());
}

#[test]
fn test_purchase_only_order_is_unchanged() {
    // Mixed rules over an ordinary purchase
    let mut program = single_rule_program(RewardPointMode::Unit, 2.0);
    program.rules.push(Rule {
        id: "spend".to_string(),
        any_product: true,
        minimum_amount: 10.0,
        reward_point_mode: RewardPointMode::Money,
        reward_point_amount: 0.05,
        ..Default::default()
    });
    program.rules.push(Rule {
        id: "visit".to_string(),
        any_product: true,
        minimum_qty: 5.0,
        reward_point_mode: RewardPointMode::Order,
        reward_point_amount: 100.0,
        ..Default::default()
    });

    let lines = [line("L1", "mug", 2.0, 24.0), line("L2", "tea", 1.0, 6.49)];
    let result = calculate(&lines, &[program]);

    // 2 × 2 mugs + round(0.05 × 30.49) = 4 + 1.52; visit needs 5 units
    assert_eq!(points(&result, "loyalty"), vec![5.52]);
    let counted: Vec<&str> = result
        .counted_rules("loyalty")
        .unwrap()
        .iter()
        .map(|r| r.rule_id.as_str())
        .collect();
    assert_eq!(counted, vec!["rule", "spend"]);
}

#[test]
fn test_own_reward_line_never_feeds_back() {
    let program = single_rule_program(RewardPointMode::Unit, 1.0);
    let reward_line = OrderLine {
        reward: Some(RewardRef {
            id: "free-mug".to_string(),
            reward_type: RewardType::Product,
            program: RewardProgram {
                id: "loyalty".to_string(),
                program_type: ProgramType::Loyalty,
                trigger: Default::default(),
            },
        }),
        reward_product_id: Some("mug".to_string()),
        ..line("L2", "mug", 1.0, 0.0)
    };

    let result = calculate(&[line("L1", "mug", 3.0, 36.0), reward_line], &[program]);
    assert_eq!(points(&result, "loyalty"), vec![3.0]);
    let applied = &result.counted_rules("loyalty").unwrap()[0];
    assert_eq!(applied.qty_per_product.len(), 1);
}

#[test]
fn test_calculation_is_deterministic() {
    let programs = [single_rule_program(RewardPointMode::Money, 0.1)];
    let lines = [line("L1", "mug", 3.0, 17.77), line("L2", "mug", -1.0, -5.92)];

    assert_eq!(calculate(&lines, &programs), calculate(&lines, &programs));
}

#[test]
fn test_programs_from_json_snapshot() {
    let programs: Vec<Program> = serde_json::from_str(
        r#"[{
            "id": "loyalty",
            "program_type": "loyalty",
            "trigger": "auto",
            "applies_on": "both",
            "rules": [{
                "id": "rule",
                "any_product": true,
                "minimum_amount_tax_mode": "excl",
                "reward_point_mode": "unit",
                "reward_point_amount": 1.5
            }]
        }]"#,
    )
    .unwrap();
    let lines: Vec<OrderLine> = serde_json::from_str(
        r#"[{"id": "L1", "product_id": "mug", "quantity": -2, "price_with_tax": -24, "price_without_tax": -20}]"#,
    )
    .unwrap();

    let awards = calculate(&lines, &programs).into_award_map();
    assert_eq!(
        serde_json::to_string(&awards["loyalty"]).unwrap(),
        r#"[{"points":-3.0}]"#
    );
}
