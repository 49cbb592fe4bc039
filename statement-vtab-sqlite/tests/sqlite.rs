#[cfg(test)]
mod tests {
    use statement_vtab_core::Value;
    use statement_vtab_sqlite::{ModuleConfig, SqliteConnection};
    use statement_vtab_tests::{
        error_message, execute_tests, fetch_error, fetch_values, init_logs,
    };
    use std::path::Path;
    use std::sync::Mutex;
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    async fn fresh_database(path: &str) -> SqliteConnection {
        if Path::new(path).exists() {
            fs::remove_file(path).await.expect(
                format!("Failed to remove existing test database file {}", path).as_str(),
            );
        }
        assert!(
            !Path::new(path).exists(),
            "Database file should not exist before test"
        );
        let connection = SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", path))
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(path).exists(),
            "Database file should be created after connection"
        );
        connection
    }

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        let connection = fresh_database(DB_PATH).await;
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn reconnect() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/reconnect.sqlite";
        let _guard = MUTEX.lock().unwrap();
        {
            let mut connection = fresh_database(DB_PATH).await;
            let module = connection
                .register_statement_module(ModuleConfig::default())
                .expect("Could not register the module");
            connection
                .execute("CREATE TABLE pairs (k INTEGER, v TEXT); INSERT INTO pairs VALUES (1, 'a'), (2, 'b');")
                .await
                .expect("Could not create pairs");
            connection
                .execute(module.create_table_sql("pair", "SELECT v FROM pairs WHERE k = :k", false))
                .await
                .expect("Could not create the statement table");
        }

        // The declaration is stored in the schema, a new connection needs the module again
        let mut connection = SqliteConnection::connect(&format!("sqlite://{}", DB_PATH))
            .await
            .expect("Could not reopen the database");
        let error = fetch_error(&mut connection, "SELECT v FROM pair(1)").await;
        assert!(
            error_message(&error).contains("no such module: statement"),
            "{error:#}"
        );
        connection
            .register_statement_module(ModuleConfig::default())
            .expect("Could not register the module");
        let rows = fetch_values(&mut connection, "SELECT v, k FROM pair(2)").await;
        assert_eq!(rows, [[Value::from("b"), Value::from(2)]]);
        connection
            .execute("DROP TABLE pair")
            .await
            .expect("Could not drop the statement table");
        drop(connection);
        fs::remove_file(DB_PATH)
            .await
            .expect("Failed to remove the test database file");
    }
}
