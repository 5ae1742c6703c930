use crate::synth::context::{Context, LiteralPools};
use crate::synth::oracle::{Example, ExampleOracle, environment_from_examples, goal_from_examples};
use serde_json::{Value, json};

#[derive(Clone, Debug)]
pub struct DemoTask {
    pub name: &'static str,
    pub description: &'static str,
    pub examples: Vec<Example>,
    pub pools: LiteralPools,
    pub max_size: usize,
}

impl DemoTask {
    /// Synthesis context with the environment and goal inferred from the
    /// examples.
    pub fn context(&self) -> Context {
        Context::new(
            environment_from_examples(&self.examples),
            goal_from_examples(&self.examples),
        )
        .with_pools(self.pools.clone())
        .with_max_size(self.max_size)
    }

    pub fn oracle(&self) -> ExampleOracle {
        ExampleOracle::new(self.examples.clone())
    }
}

pub fn find_task(name: &str) -> Option<DemoTask> {
    all_tasks().into_iter().find(|task| task.name == name)
}

pub fn all_tasks() -> Vec<DemoTask> {
    vec![
        task(
            "sum_pair",
            "Add two integers",
            vec![(vec![json!(1), json!(2)], json!(3)), (vec![json!(5), json!(3)], json!(8))],
            pools(&[], &[]),
        ),
        task(
            "double",
            "Double an integer",
            vec![(vec![json!(3)], json!(6)), (vec![json!(-4)], json!(-8))],
            pools(&[], &[2]),
        ),
        task(
            "shout",
            "Upper-case a word",
            vec![(vec![json!("hi")], json!("HI")), (vec![json!("ok")], json!("OK"))],
            pools(&[], &[]),
        ),
        task(
            "reverse",
            "Reverse a string",
            vec![(vec![json!("abc")], json!("cba")), (vec![json!("stop")], json!("pots"))],
            pools(&[], &[]),
        ),
        task(
            "area_code",
            "First three digits of a phone number",
            vec![
                (vec![json!("5551234567")], json!("555")),
                (vec![json!("2125550000")], json!("212")),
            ],
            pools(&[], &[0, 3]),
        ),
        task(
            "rotate_half",
            "Swap the halves of a six-character string",
            vec![
                (vec![json!("abcdef")], json!("defabc")),
                (vec![json!("123456")], json!("456123")),
            ],
            pools(&[], &[0, 3]),
        ),
        task(
            "initial",
            "First letter of a name",
            vec![(vec![json!("alice")], json!("a")), (vec![json!("bob")], json!("b"))],
            pools(&[], &[0]),
        ),
        task(
            "join_words",
            "Join words with spaces",
            vec![
                (vec![json!(["a", "b"])], json!("a b")),
                (vec![json!(["x", "y", "z"])], json!("x y z")),
            ],
            pools(&[" "], &[]),
        ),
        task(
            "key_value",
            "Parse a query string into a record",
            vec![
                (vec![json!("a=1&b=2")], json!({"a": "1", "b": "2"})),
                (vec![json!("a=x&b=y")], json!({"a": "x", "b": "y"})),
            ],
            pools(&[], &[]),
        ),
    ]
}

fn task(
    name: &'static str,
    description: &'static str,
    examples: Vec<(Vec<Value>, Value)>,
    pools: LiteralPools,
) -> DemoTask {
    DemoTask {
        name,
        description,
        examples: examples
            .into_iter()
            .map(|(inputs, output)| Example::new(inputs, output))
            .collect(),
        pools,
        max_size: Context::DEFAULT_MAX_SIZE,
    }
}

fn pools(strings: &[&str], ints: &[i64]) -> LiteralPools {
    LiteralPools::new(strings.iter().map(|s| s.to_string()).collect(), ints.to_vec())
}

#[cfg(test)]
mod tests {
    use super::{all_tasks, find_task};
    use crate::synth::search::Synthesizer;
    use crate::synth::types::Type;
    use std::collections::BTreeSet;

    #[test]
    fn task_names_are_unique() {
        let tasks = all_tasks();
        let names: BTreeSet<&str> = tasks.iter().map(|task| task.name).collect();
        assert_eq!(names.len(), tasks.len());
        assert!(find_task("shout").is_some());
        assert!(find_task("missing").is_none());
    }

    #[test]
    fn inferred_context_widens_varying_arguments() {
        let task = find_task("sum_pair").expect("task exists");
        let ctx = task.context();
        assert_eq!(ctx.goal, Type::int());
        assert_eq!(ctx.environment["arg0"], Type::int());
    }

    #[test]
    fn every_demo_task_is_solved() {
        let synth = Synthesizer::standard();
        for task in all_tasks() {
            let mut oracle = task.oracle();
            let solution = synth
                .synthesize(&task.context(), &mut oracle)
                .unwrap_or_else(|err| panic!("{} failed: {err}", task.name));
            let checks = oracle.check(&solution.program);
            assert!(checks.iter().all(|c| c.passed), "{}: {}", task.name, solution.program);
        }
    }
}
