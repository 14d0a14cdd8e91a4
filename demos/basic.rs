//! Basic example demonstrating Skynology Rust SDK usage.
//!
//! Reads `SKYNOLOGY_APP_ID` and `SKYNOLOGY_APP_KEY` from the environment.

use skynology::{field, query, Config, Object, Skynology};

#[tokio::main]
async fn main() -> skynology::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let app_id = std::env::var("SKYNOLOGY_APP_ID").unwrap_or_default();
  let app_key = std::env::var("SKYNOLOGY_APP_KEY").unwrap_or_default();
  let mut client = Skynology::new(Config::new(app_id, app_key))?;

  // Log in, or pick up the session from the last run
  let user = match client.resume_session() {
    Some(user) => user,
    None => client.login_with_user_name("alice", "secret").await?,
  };
  println!("Logged in as {} ({})", user.user_name(), user.id());

  // Create a post only its author can edit
  let mut post = Object::new("Post");
  post
    .set("title", "Hello Skynology")
    .add_to_array("tags", "intro")
    .set_read_access("*", true)
    .set_read_write_access(user.id(), true, true);
  post.save(&client).await?;
  println!("Created post {}", post.id());

  // Atomic counter
  post.increment("views");
  post.save(&client).await?;
  println!("Views: {}", post.get_int("views"));

  // Query
  let found = query("Post")
    .filter(field("tags").all(vec!["intro".into()]))
    .starts_with("title", "Hello")
    .order_by_descending("createdAt")
    .take(10)
    .count(true)
    .find(&client)
    .await?;
  println!("{} matching posts", found.count);
  for obj in &found.objects {
    println!("  {} {}", obj.id(), obj.get_string("title"));
  }

  post.delete(&client).await?;

  let mut user = user;
  client.logout(&mut user).await?;
  println!("Logged out");

  Ok(())
}
