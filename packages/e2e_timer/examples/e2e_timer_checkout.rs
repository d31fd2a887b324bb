//! Records a checkout transaction whose inventory lookup fans out to two services, one of
//! which fails, then prints the span tree and its JSON document.

use std::io;
use std::thread;
use std::time::Duration;

use e2e_timer::{JsonRenderer, Timer};

fn main() -> e2e_timer::Result<()> {
    let timer = Timer::builder("checkout")
        .renderer(JsonRenderer::pretty())
        .reply_timeout(Duration::from_secs(1))
        .build();

    let inventory = timer.start_contributor("inventory")?;

    thread::scope(|scope| {
        let stock = scope.spawn(|| -> e2e_timer::Result<()> {
            let call = inventory.start_service_call("stock", "http://stock-svc")?;
            thread::sleep(Duration::from_millis(15));
            call.end(Some(&io::Error::other("timeout")))
        });

        let pricing = scope.spawn(|| -> e2e_timer::Result<()> {
            let call = inventory.start_service_call("pricing", "http://pricing-svc")?;
            thread::sleep(Duration::from_millis(5));
            call.end(None)
        });

        stock.join().expect("stock lookup thread panicked")?;
        pricing.join().expect("pricing lookup thread panicked")
    })?;

    // The stale stock level was served from cache, so the phase itself succeeded.
    inventory.end(None)?;

    let payment = timer.start_contributor("payment")?;
    thread::sleep(Duration::from_millis(10));
    payment.end(None)?;

    timer.stop(None)?;

    println!("{}", timer.snapshot()?);
    println!("{}", timer.to_document()?);
    println!("error free: {}", timer.is_error_free()?);

    timer.terminate()
}
