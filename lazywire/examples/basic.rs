//! Basic example of the lazywire container.

use std::sync::Arc;

use lazywire::prelude::*;

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

type SharedLogger = Arc<dyn Logger>;

struct Database {
    url: String,
    logger: SharedLogger,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
}

impl Injectable for UserRepository {
    const DEPENDENCIES: &'static [&'static str] = &["database"];

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(UserRepository { db: args.get::<Database>("database")? })
    }
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

struct UserService {
    repo: Arc<UserRepository>,
    logger: SharedLogger,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("lazywire_container=debug")
        .init();

    let container = Container::builder()
        .value("database_url", String::from("postgres://localhost/myapp"))
        .factory("logger", Factory::lazy(|| Ok::<SharedLogger, _>(Arc::new(ConsoleLogger))))
        .factory(
            "database",
            Factory::new(["database_url", "logger"], |args| {
                Ok(Database {
                    url: args.get::<String>("database_url")?.as_str().to_owned(),
                    logger: Arc::clone(&*args.get::<SharedLogger>("logger")?),
                })
            }),
        )
        .factory("user_repository", singleton_factory::<UserRepository>())
        .factory(
            "user_service",
            Factory::new(["user_repository", "logger"], |args| {
                Ok(UserService {
                    repo: args.get::<UserRepository>("user_repository")?,
                    logger: Arc::clone(&*args.get::<SharedLogger>("logger")?),
                })
            }),
        )
        .factory(
            "greet",
            Factory::new(["logger"], |args| {
                let logger = Arc::clone(&*args.get::<SharedLogger>("logger")?);
                Ok(Callable::new(move |call| {
                    let who = call.get::<String>(0)?;
                    logger.log(&format!("Greeting {who}"));
                    Ok(format!("Hello, {who}!"))
                }))
            }),
        )
        .validate_on_build(true)
        .build()?;

    println!("Container built: {container:?}");

    let service = container.get::<UserService>("user_service")?;
    println!("{}", service.get_user(42));

    // memoized: the same instance comes back
    let again = container.get::<UserService>("user_service")?;
    println!("same service: {}", Arc::ptr_eq(&service, &again));

    let greeting = container.call::<String>("greet", &[arg(String::from("lazywire"))])?;
    println!("{greeting}");

    let overridden = container.inject::<String>(
        &Factory::new(["database_url"], |args| {
            Ok(format!("would connect to {}", args.get::<String>("database_url")?))
        }),
        &Overrides::new().with("database_url", String::from("sqlite::memory:")),
    )?;
    println!("{overridden}");

    Ok(())
}
