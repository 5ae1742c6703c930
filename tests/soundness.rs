use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use typesynth::synth::{
    Bindings, Context, Environment, Hole, HoleExpansion, HoleKind, LiteralPools,
    SignatureCatalog, StandardExpander, Term, Type, eval, generate_value, interpret,
};

const SAMPLES_PER_TERM: usize = 16;

fn environment() -> Environment {
    [
        ("m", Type::wrap(&json!(3))),
        ("n", Type::int()),
        ("ns", Type::array_of(Type::int())),
        ("r", Type::record([("age", Type::int()), ("name", Type::string())])),
        ("s", Type::string()),
        ("t", Type::wrap(&json!("k=v&x=y"))),
        ("xs", Type::array_of(Type::string())),
    ]
    .into_iter()
    .map(|(name, ty)| (name.to_string(), ty))
    .collect()
}

fn sample_bindings(env: &Environment, rng: &mut StdRng) -> Option<Bindings> {
    env.iter()
        .map(|(name, ty)| generate_value(ty, rng, 2).map(|value| (name.clone(), value)))
        .collect()
}

fn expand(goal: &Type, ctx: &Context, catalog: &SignatureCatalog) -> Vec<Term> {
    let hole = Hole {
        goal: goal.clone(),
        kind: HoleKind::Regular,
    };
    StandardExpander::default().expand(&hole, ctx, catalog)
}

/// Closed terms reachable in one or two expansion steps from `goal`. Open
/// candidates are closed by filling every hole with the same-index closed
/// candidate of its own goal.
fn closed_terms(goal: &Type, ctx: &Context, catalog: &SignatureCatalog) -> Vec<Term> {
    let mut out = Vec::new();
    for candidate in expand(goal, ctx, catalog) {
        if candidate.is_closed() {
            out.push(candidate);
            continue;
        }
        let options: Vec<Vec<Term>> = candidate
            .regular_holes()
            .into_iter()
            .map(|hole| {
                expand(&hole.goal, ctx, catalog)
                    .into_iter()
                    .filter(Term::is_closed)
                    .take(4)
                    .collect()
            })
            .collect();
        if options.iter().any(Vec::is_empty) {
            continue;
        }
        for pick in 0..4 {
            let fillings: Vec<Term> = options
                .iter()
                .map(|choices| choices[pick % choices.len()].clone())
                .collect();
            let (filled, _) = candidate.fill_regular_holes(&fillings).resolve_dependent_holes();
            if filled.is_closed() {
                out.push(filled);
            }
        }
    }
    out
}

#[test]
fn evaluation_stays_within_interpreted_type() {
    let env = environment();
    let catalog = SignatureCatalog::standard();
    let pools = LiteralPools::new(vec!["-".to_string(), "=".to_string()], vec![0, 1, 3]);
    let goals = [
        Type::int(),
        Type::string(),
        Type::array_of(Type::string()),
        Type::array_of(Type::int()),
        Type::record([("k", Type::string()), ("x", Type::string())]),
        Type::union(vec![Type::int(), Type::string()]),
        Type::Top,
    ];
    let mut rng = StdRng::seed_from_u64(2024);
    let mut checked = 0usize;

    for goal in goals {
        let ctx = Context::new(env.clone(), goal.clone()).with_pools(pools.clone());
        for term in closed_terms(&goal, &ctx, &catalog) {
            let ty = interpret(&env, &catalog, &term)
                .unwrap_or_else(|err| panic!("{term} failed to interpret: {err}"));
            for _ in 0..SAMPLES_PER_TERM {
                let Some(bindings) = sample_bindings(&env, &mut rng) else {
                    continue;
                };
                if let Ok(value) = eval(&term, &bindings) {
                    assert!(
                        Type::wrap(&value).is_subtype_of(&ty),
                        "{term} evaluated to {value}, outside {ty}"
                    );
                    checked += 1;
                }
            }
        }
    }

    assert!(checked > 500, "only {checked} evaluations succeeded");
}

#[test]
fn fixed_query_string_projects_into_record() {
    let env = environment();
    let catalog = SignatureCatalog::standard();
    let goal = Type::record([("k", Type::string()), ("x", Type::string())]);
    let ctx = Context::new(env.clone(), goal.clone());
    let mut rng = StdRng::seed_from_u64(5);

    let template = expand(&goal, &ctx, &catalog)
        .into_iter()
        .find(|term| term.is_closed() && term.to_string().contains("t.split"))
        .expect("query-string template for `t`");
    let bindings = sample_bindings(&env, &mut rng).expect("environment is inhabited");

    assert_eq!(eval(&template, &bindings), Ok(json!({"k": "v", "x": "y"})));
    let ty = interpret(&env, &catalog, &template).expect("template interprets");
    assert!(ty.is_subtype_of(&goal));
}
