use formulon::{Evaluator, FormulonError, FunctionDescriptor, ParamKind, Value};
use std::sync::Arc;

fn main() -> Result<(), FormulonError> {
    // 1. Register a host function package (idempotent per package name).
    let mut eval = Evaluator::with_package(
        "demo.financials",
        vec![FunctionDescriptor::new(
            "margin",
            vec![ParamKind::Number, ParamKind::Number],
            ParamKind::Number,
            Arc::new(|args: &[Value]| {
                let revenue = args[0].as_number();
                let cost = args[1].as_number();
                (revenue - cost) / revenue
            }),
        )],
    )?;

    // 2. Give string literals a meaning: here, a tiny symbol table.
    eval.set_string_resolver(|symbol| match symbol {
        "revenue" => Value::Number(1.25e6),
        "cost" => Value::Number(9.8e5),
        other => {
            println!("unknown symbol {other:?}, defaulting to 0");
            Value::Number(0.0)
        }
    });

    // 3. Validate without executing.
    let formula = r#"=IF(MARGIN("revenue", "cost") > 20%, 1, 0)"#;
    eval.validate(formula)?;

    // 4. Compile once, replay as often as needed.
    let program = eval.compile(formula)?;
    println!("{} instructions", program.len());
    println!("{formula} -> {}", eval.run(&program)?);

    // 5. Or compile and evaluate in one shot.
    println!("2k * 3 -> {}", eval.evaluate("2k * 3")?);
    println!("ROUND(2.345, 2) -> {}", eval.evaluate("ROUND(2.345, 2)")?);

    Ok(())
}
