// Demo: Linear Regression on Vole's data pipeline
//
// End-to-end tour of the crate:
//   1. Generate synthetic data: y = Xw + b + noise, 1000 train / 1000 val
//   2. Minibatch SGD over a shuffling DataLoader (closed-form MSE gradients)
//   3. Validation passes over an ordered StreamLoader
//   4. Save the fitted parameters, reload them into a fresh tree, verify

use ndarray::{arr1, Array1};

use vole::checkpoint;
use vole::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!(" Vole Linear Regression \n");

    //  Step 1: Synthetic data
    let data = SyntheticRegression::generate(
        SyntheticConfig::default()
            .weights(vec![2.0, -3.4])
            .bias(4.2)
            .noise_std(0.01)
            .num_train(1000)
            .num_val(1000)
            .seed(42),
    )?;

    let mut train = data.loader(
        Split::Train,
        DataLoaderConfig::default().batch_size(32).seed(7),
    )?;
    let mut val = data.stream_loader(Split::Val, StreamConfig::default().batch_size(256))?;

    println!(
        "Dataset: {} train / {} val, {} features, {} batches per epoch",
        data.num_train(),
        data.num_val(),
        data.feature_dim(),
        train.num_batches(),
    );

    //  Step 2: Minibatch SGD
    let mut w = Array1::<f64>::zeros(data.feature_dim());
    let mut b = 0.0_f64;
    let lr = 0.03_f64;

    for epoch in 0..3 {
        for batch in train.iter() {
            let m = batch.len() as f64;
            let preds = batch.features.dot(&w) + b;
            let err = preds - batch.targets.column(0);

            // MSE gradients: dL/dw = 2/m Xᵀe, dL/db = 2 mean(e)
            let grad_w = batch.features.t().dot(&err) * (2.0 / m);
            let grad_b = 2.0 * err.sum() / m;

            w.scaled_add(-lr, &grad_w);
            b -= lr * grad_b;
        }

        //  Step 3: Validation pass (ordered, reproducible)
        let mut sse = 0.0;
        let mut count = 0usize;
        for batch in val.iter() {
            let preds = batch.features.dot(&w) + b;
            let err = preds - batch.targets.column(0);
            sse += err.mapv(|e| e * e).sum();
            count += batch.len();
        }
        println!("epoch {epoch}: val mse = {:.6}", sse / count as f64);
    }

    println!(
        "\nFitted: w = [{:.4}, {:.4}] (true [2.0, -3.4]), b = {:.4} (true 4.2)",
        w[0], w[1], b,
    );

    //  Step 4: Checkpoint round trip
    let mut params = ParamTree::new();
    params.insert("linreg/weight", w.clone().into_dyn())?;
    params.insert("linreg/bias", arr1(&[b]).into_dyn())?;

    let path = std::env::temp_dir().join("vole_linreg_demo.vole");
    checkpoint::save_params(&path, &params)?;

    // A fresh tree with the same architecture, then apply the checkpoint.
    let mut restored = ParamTree::new();
    restored.insert("linreg/weight", Array1::<f64>::zeros(data.feature_dim()).into_dyn())?;
    restored.insert("linreg/bias", Array1::<f64>::zeros(1).into_dyn())?;
    let loaded = checkpoint::load_into(&path, &mut restored)?;
    std::fs::remove_file(&path).ok();

    let weights_match = restored == params;
    println!("checkpoint: restored {loaded} parameters, values match: {weights_match}");

    Ok(())
}
