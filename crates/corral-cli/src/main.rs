use std::time::Duration;

use tokio::time::sleep;

use corral_core::{TaskHandle, TaskManager, TaskResult};

/// Example task 1
async fn task1() -> String {
    sleep(Duration::from_millis(200)).await;
    "task1".to_string()
}

/// Example task 2
async fn task2() -> String {
    sleep(Duration::from_millis(300)).await;
    "task2".to_string()
}

/// Example task 3
async fn task3() -> String {
    sleep(Duration::from_millis(100)).await;
    "task3".to_string()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // (A) handle-correlated mode: submit deferred, launch, resolve by handle
    let manager: TaskManager<String> = TaskManager::new();

    let mut handles: Vec<TaskHandle> = Vec::new();
    handles.push(manager.submit(task1()).await.unwrap());
    handles.push(manager.submit(task2()).await.unwrap());
    handles.push(manager.submit(task3()).await.unwrap());
    println!("submitted {} tasks", handles.len());

    manager.launch_all().await.unwrap();

    for handle in &handles {
        let handle = *handle;
        manager
            .resolve_with_callback(handle, move |result: TaskResult<String>| match result {
                Ok(value) => println!("{handle} -> {value}"),
                Err(failure) => println!("{handle} failed: {failure}"),
            })
            .await
            .unwrap();
    }

    // (B) misuse is a typed error, not a crash
    if let Err(err) = manager.resolve(handles[0]).await {
        println!("second resolve: {err}");
    }

    // (C) arguments are captured by the submitted future; a different result
    // type means a different manager
    let arithmetic: TaskManager<i64> = TaskManager::new();
    let (a, b) = (4i64, 3i64);
    let diff = arithmetic.submit_and_launch(async move { a - b }).await.unwrap();
    println!("{a} - {b} = {}", arithmetic.resolve(diff).await.unwrap());
    arithmetic.shutdown().await;

    // (D) fire-and-forget: no handles, completion observed via callbacks and
    // the idle counter
    let print_result = |result: TaskResult<String>| match result {
        Ok(value) => println!("detached callback: {value}"),
        Err(failure) => println!("detached task failed: {failure}"),
    };
    manager.dispatch(task1(), print_result).unwrap();
    manager.dispatch(task2(), print_result).unwrap();
    manager.dispatch(task3(), print_result).unwrap();
    manager.wait_for_idle().await;

    // (E) two-phase teardown: detached work first, then the registry
    manager.shutdown().await;
    tracing::info!(remaining = manager.counts().await.live(), "manager shut down");
    println!("program complete");
}
