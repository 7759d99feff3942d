//! Sample data for development and tests.

use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::entities::*;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "Ivan",
    "John", "Ken", "Leslie", "Margaret", "Niklaus", "Radia", "Shafi", "Tim", "Valerie", "Yukihiro",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Bartik", "Cerf", "Dijkstra", "Engelbart", "Hamilton", "Hopper", "Kahn", "Knuth",
    "Lamport", "Liskov", "Lovelace", "Matsumoto", "Perlman", "Ritchie", "Shannon", "Sutherland",
    "Thompson", "Turing", "Wirth",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "voluptate",
    "velit", "esse", "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint", "occaecat",
];

/// Random text and values, with email uniqueness across one run.
pub struct Faker<R: Rng> {
    rng: R,
    emails: HashSet<String>,
}

impl<R: Rng> Faker<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            emails: HashSet::new(),
        }
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        // Every list handed in here is a non-empty constant.
        &items[self.rng.gen_range(0..items.len())]
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn name(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    pub fn unique_safe_email(&mut self) -> String {
        let local = format!("{}.{}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES)).to_lowercase();
        let domain = self.pick(DOMAINS);

        let mut email = format!("{local}@{domain}");
        let mut suffix = 1;
        while self.emails.contains(&email) {
            suffix += 1;
            email = format!("{local}{suffix}@{domain}");
        }
        self.emails.insert(email.clone());
        email
    }

    /// Six words, give or take two, capitalized and closed with a period.
    pub fn sentence(&mut self) -> String {
        let count = self.rng.gen_range(4..=8);
        let words: Vec<&str> = (0..count).map(|_| *self.pick(WORDS)).collect();
        let text = words.join(" ");

        let mut chars = text.chars();
        match chars.next() {
            Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    pub fn paragraph(&mut self) -> String {
        let count = self.rng.gen_range(3..=5);
        (0..count)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn paragraphs(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| self.paragraph())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// `true` with the given percent chance.
    pub fn boolean(&mut self, chance_of_true: u32) -> bool {
        self.rng.gen_range(0..100) < chance_of_true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorFactory {
    is_active: Option<bool>,
}

impl AuthorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(mut self) -> Self {
        self.is_active = Some(true);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = Some(false);
        self
    }

    pub fn make<R: Rng>(&self, faker: &mut Faker<R>) -> authors::ActiveModel {
        authors::ActiveModel {
            name: Set(faker.name()),
            email: Set(faker.unique_safe_email()),
            bio: Set(Some(faker.paragraphs(2))),
            is_active: Set(self.is_active.unwrap_or_else(|| faker.boolean(90))),
            ..Default::default()
        }
    }

    pub async fn create<C, R>(&self, db: &C, faker: &mut Faker<R>) -> Result<authors::Model, DbErr>
    where
        C: ConnectionTrait,
        R: Rng,
    {
        self.make(faker).insert(db).await
    }

    pub async fn create_many<C, R>(&self, count: usize, db: &C, faker: &mut Faker<R>) -> Result<Vec<authors::Model>, DbErr>
    where
        C: ConnectionTrait,
        R: Rng,
    {
        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            created.push(self.create(db, faker).await?);
        }
        Ok(created)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostFactory {
    is_published: Option<bool>,
    author_id: Option<i32>,
}

impl PostFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(mut self) -> Self {
        self.is_published = Some(true);
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.is_published = Some(false);
        self
    }

    pub fn for_author(mut self, author_id: i32) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn make<R: Rng>(&self, author_id: i32, faker: &mut Faker<R>) -> posts::ActiveModel {
        posts::ActiveModel {
            title: Set(faker.sentence()),
            content: Set(faker.paragraphs(3)),
            author_id: Set(author_id),
            is_published: Set(self.is_published.unwrap_or_else(|| faker.boolean(70))),
            ..Default::default()
        }
    }

    /// Insert one post; without a preset author a fresh one is created.
    pub async fn create<C, R>(&self, db: &C, faker: &mut Faker<R>) -> Result<posts::Model, DbErr>
    where
        C: ConnectionTrait,
        R: Rng,
    {
        let author_id = match self.author_id {
            Some(id) => id,
            None => AuthorFactory::new().create(db, faker).await?.id,
        };
        self.make(author_id, faker).insert(db).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub authors: usize,
    pub posts: usize,
}

pub const ACTIVE_AUTHORS: usize = 9;
pub const INACTIVE_AUTHORS: usize = 1;
pub const POSTS: usize = 30;

/// Nine active authors, one inactive author, and thirty posts spread
/// across them at random.
pub async fn run<C, R>(db: &C, faker: &mut Faker<R>) -> Result<SeedSummary, DbErr>
where
    C: ConnectionTrait,
    R: Rng,
{
    let mut authors = AuthorFactory::new()
        .active()
        .create_many(ACTIVE_AUTHORS, db, faker)
        .await?;
    authors.extend(
        AuthorFactory::new()
            .inactive()
            .create_many(INACTIVE_AUTHORS, db, faker)
            .await?,
    );

    let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
    for _ in 0..POSTS {
        let factory = match faker.choose(&author_ids) {
            Some(id) => PostFactory::new().for_author(*id),
            None => PostFactory::new(),
        };
        factory.create(db, faker).await?;
    }

    tracing::info!(authors = authors.len(), posts = POSTS, "seeded database");

    Ok(SeedSummary {
        authors: authors.len(),
        posts: POSTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn faker() -> Faker<StdRng> {
        Faker::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn emails_are_unique_within_a_run() {
        let mut faker = faker();
        let emails: HashSet<String> = (0..500).map(|_| faker.unique_safe_email()).collect();
        assert_eq!(emails.len(), 500);
        assert!(emails.iter().all(|e| e.ends_with(".com") || e.ends_with(".org") || e.ends_with(".net")));
    }

    #[test]
    fn sentences_are_capitalized() {
        let mut faker = faker();
        for _ in 0..20 {
            let sentence = faker.sentence();
            assert!(sentence.ends_with('.'));
            assert!(sentence.chars().next().unwrap().is_uppercase());
            assert!(sentence.chars().count() <= 255);
        }
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let mut faker = faker();
        assert_eq!(faker.paragraphs(3).split("\n\n").count(), 3);
    }

    #[test]
    fn boolean_extremes() {
        let mut faker = faker();
        assert!((0..50).all(|_| faker.boolean(100)));
        assert!((0..50).all(|_| !faker.boolean(0)));
    }

    #[test]
    fn factory_states_override_randomness() {
        let mut faker = faker();
        let author = AuthorFactory::new().inactive().make(&mut faker);
        assert_eq!(author.is_active, Set(false));

        let post = PostFactory::new().published().make(3, &mut faker);
        assert_eq!(post.is_published, Set(true));
        assert_eq!(post.author_id, Set(3));
    }
}
