//! Database backed behaviour. Needs `DATABASE_URL` pointing at a PostgreSQL
//! server the tests may create databases on:
//!
//! `cargo test --test store -- --ignored`

use std::path::{Path, PathBuf};

use foodgram::{
    actions::{
        add_recipe_relation, create_ingredient, create_recipe, create_tag, fetch_recipes,
        follow_user, get_recipe_read, register_user, remove_recipe_relation, shopping_list,
        unfollow_user, update_recipe, RecipeFilter, RecipeRelation,
    },
    api::{
        recipes::{RecipeOperation, RecipeOutcome},
        Context,
    },
    config::{Config, Limits},
    jwt::SessionData,
    pagination::PageRequest,
    schema::{Id, Ingredient, Tag, User, UserRole},
    serializers::{
        IngredientAmountPayload, IngredientPayload, RecipeDraft, RecipePayload, TagPayload,
        UserPayload,
    },
};
use sqlx::PgPool;

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

async fn user(pool: &PgPool, username: &str) -> User {
    register_user(
        UserPayload {
            email: format!("{username}@example.com"),
            username: username.to_owned(),
            first_name: String::from("Test"),
            last_name: String::from("Cook"),
            password: String::from("correct horse"),
        },
        pool,
    )
    .await
    .unwrap()
}

async fn ingredient(pool: &PgPool, name: &str, unit: &str) -> Ingredient {
    create_ingredient(
        IngredientPayload {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
        },
        pool,
    )
    .await
    .unwrap()
}

async fn tag(pool: &PgPool, slug: &str, color: &str) -> Tag {
    create_tag(
        TagPayload {
            name: slug.to_uppercase(),
            color: color.to_owned(),
            slug: slug.to_owned(),
        },
        pool,
    )
    .await
    .unwrap()
}

fn draft(name: &str, ingredients: Vec<(Id, i16)>, tags: Vec<Id>) -> RecipeDraft {
    RecipeDraft {
        name: name.to_owned(),
        text: String::from("Mix everything."),
        image: Some(String::from("/media/recipes/test.png")),
        cooking_time: 15,
        ingredients,
        tags,
    }
}

async fn recipe_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn cart_is_aggregated_into_a_shopping_list(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let flour = ingredient(&pool, "flour", "g").await;
    let sugar = ingredient(&pool, "sugar", "g").await;
    let egg = ingredient(&pool, "egg", "pcs").await;
    let baking = tag(&pool, "baking", "#E26C2D").await;
    let limits = Limits::default();

    let a = create_recipe(
        cook.id,
        &draft("A", vec![(flour.id, 200), (sugar.id, 50)], vec![baking.id]),
        &limits,
        &pool,
    )
    .await
    .unwrap();
    let b = create_recipe(
        cook.id,
        &draft("B", vec![(flour.id, 100), (egg.id, 2)], vec![baking.id]),
        &limits,
        &pool,
    )
    .await
    .unwrap();

    for recipe in [a, b] {
        add_recipe_relation(RecipeRelation::ShoppingCart, recipe, cook.id, &pool)
            .await
            .unwrap();
    }

    let list = shopping_list(cook.id, &pool).await.unwrap();
    assert_eq!(
        list.to_string(),
        "egg (pcs) - 2\nflour (g) - 300\nsugar (g) - 50"
    );
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn shopping_list_is_alphabetical_and_keeps_units_apart(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let banana = ingredient(&pool, "banana", "pcs").await;
    let apple = ingredient(&pool, "Apple", "pcs").await;
    let cherry = ingredient(&pool, "Cherry", "g").await;
    let milk_ml = ingredient(&pool, "milk", "ml").await;
    let milk_cup = ingredient(&pool, "milk", "cup").await;
    let fruit = tag(&pool, "fruit", "#E26C2D").await;
    let limits = Limits::default();

    let a = create_recipe(
        cook.id,
        &draft(
            "Smoothie",
            vec![(banana.id, 2), (milk_ml.id, 200), (cherry.id, 100)],
            vec![fruit.id],
        ),
        &limits,
        &pool,
    )
    .await
    .unwrap();
    let b = create_recipe(
        cook.id,
        &draft(
            "Crumble",
            vec![(apple.id, 3), (milk_cup.id, 1), (cherry.id, 50)],
            vec![fruit.id],
        ),
        &limits,
        &pool,
    )
    .await
    .unwrap();

    for recipe in [a, b] {
        add_recipe_relation(RecipeRelation::ShoppingCart, recipe, cook.id, &pool)
            .await
            .unwrap();
    }

    let list = shopping_list(cook.id, &pool).await.unwrap();
    assert_eq!(
        list.to_string(),
        "Apple (pcs) - 3\nbanana (pcs) - 2\nCherry (g) - 150\nmilk (cup) - 1\nmilk (ml) - 200"
    );
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn empty_cart_gives_empty_document(pool: PgPool) {
    let cook = user(&pool, "cook").await;

    let list = shopping_list(cook.id, &pool).await.unwrap();
    assert!(list.is_empty());
    assert_eq!(list.to_string(), "");
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn favorite_is_stored_once(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let salt = ingredient(&pool, "salt", "g").await;
    let dinner = tag(&pool, "dinner", "#49B64E").await;
    let recipe = create_recipe(
        cook.id,
        &draft("Soup", vec![(salt.id, 5)], vec![dinner.id]),
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    let brief = add_recipe_relation(RecipeRelation::Favorite, recipe, cook.id, &pool)
        .await
        .unwrap();
    assert_eq!(brief.name, "Soup");

    let err = add_recipe_relation(RecipeRelation::Favorite, recipe, cook.id, &pool)
        .await
        .unwrap_err();
    assert_eq!(err.code, 400);
    assert_eq!(err.info.as_deref(), Some("Recipe is already in favorites"));

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn removing_missing_relations_is_not_found(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let author = user(&pool, "author").await;
    let salt = ingredient(&pool, "salt", "g").await;
    let dinner = tag(&pool, "dinner", "#49B64E").await;
    let recipe = create_recipe(
        author.id,
        &draft("Soup", vec![(salt.id, 5)], vec![dinner.id]),
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    for relation in [RecipeRelation::Favorite, RecipeRelation::ShoppingCart] {
        let err = remove_recipe_relation(relation, recipe, cook.id, &pool)
            .await
            .unwrap_err();
        assert_eq!(err.code, 404);
    }

    let err = remove_recipe_relation(RecipeRelation::Favorite, recipe + 100, cook.id, &pool)
        .await
        .unwrap_err();
    assert_eq!(err.info.as_deref(), Some("No recipe exists with specified id"));

    let err = unfollow_user(cook.id, author.id, &pool).await.unwrap_err();
    assert_eq!(err.code, 404);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn amount_below_minimum_rolls_back_the_recipe(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let salt = ingredient(&pool, "salt", "g").await;
    let pepper = ingredient(&pool, "pepper", "g").await;
    let dinner = tag(&pool, "dinner", "#49B64E").await;
    let limits = Limits {
        min_ingredient_amount: 5,
        ..Limits::default()
    };

    let err = create_recipe(
        cook.id,
        &draft("Soup", vec![(salt.id, 10), (pepper.id, 2)], vec![dinner.id]),
        &limits,
        &pool,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code, 400);
    assert_eq!(err.field.as_deref(), Some("ingredients"));
    assert_eq!(recipe_count(&pool).await, 0);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn unknown_ingredient_rolls_back_the_recipe(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let dinner = tag(&pool, "dinner", "#49B64E").await;

    let err = create_recipe(
        cook.id,
        &draft("Soup", vec![(9999, 10)], vec![dinner.id]),
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code, 400);
    assert_eq!(recipe_count(&pool).await, 0);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn update_replaces_ingredients_and_tags(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let salt = ingredient(&pool, "salt", "g").await;
    let rice = ingredient(&pool, "rice", "g").await;
    let dinner = tag(&pool, "dinner", "#49B64E").await;
    let lunch = tag(&pool, "lunch", "#8775D2").await;
    let limits = Limits::default();

    let id = create_recipe(
        cook.id,
        &draft("Rice", vec![(salt.id, 5)], vec![dinner.id]),
        &limits,
        &pool,
    )
    .await
    .unwrap();

    let mut changed = draft("Better rice", vec![(rice.id, 300)], vec![lunch.id]);
    changed.image = None;
    update_recipe(id, &changed, &limits, &pool).await.unwrap();

    let recipe = get_recipe_read(id, Some(cook.id), &pool).await.unwrap().unwrap();
    assert_eq!(recipe.name, "Better rice");
    assert_eq!(recipe.image, "/media/recipes/test.png");
    assert_eq!(recipe.ingredients.len(), 1);
    assert_eq!(recipe.ingredients[0].name, "rice");
    assert_eq!(recipe.ingredients[0].amount, 300);
    assert_eq!(recipe.tags, vec![lunch]);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn recipe_list_filters(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let other = user(&pool, "other").await;
    let salt = ingredient(&pool, "salt", "g").await;
    let dinner = tag(&pool, "dinner", "#49B64E").await;
    let lunch = tag(&pool, "lunch", "#8775D2").await;
    let limits = Limits::default();

    let soup = create_recipe(cook.id, &draft("Soup", vec![(salt.id, 5)], vec![dinner.id]), &limits, &pool)
        .await
        .unwrap();
    create_recipe(other.id, &draft("Salad", vec![(salt.id, 1)], vec![lunch.id]), &limits, &pool)
        .await
        .unwrap();
    add_recipe_relation(RecipeRelation::Favorite, soup, other.id, &pool)
        .await
        .unwrap();

    let page = PageRequest::new(None, None, 6);

    let all = fetch_recipes(&RecipeFilter::default(), None, page, &pool).await.unwrap();
    assert_eq!(all.count, 2);
    assert_eq!(all.results[0].name, "Salad");

    let by_tag = RecipeFilter {
        tags: vec![String::from("dinner")],
        ..RecipeFilter::default()
    };
    let tagged = fetch_recipes(&by_tag, None, page, &pool).await.unwrap();
    assert_eq!(tagged.count, 1);
    assert_eq!(tagged.results[0].id, soup);

    let favorites = RecipeFilter {
        is_favorited: true,
        ..RecipeFilter::default()
    };
    let mine = fetch_recipes(&favorites, Some(other.id), page, &pool).await.unwrap();
    assert_eq!(mine.count, 1);
    assert!(mine.results[0].is_favorited);

    let anonymous = fetch_recipes(&favorites, None, page, &pool).await.unwrap();
    assert_eq!(anonymous.count, 0);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn follow_rules(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let author = user(&pool, "author").await;

    let err = follow_user(cook.id, cook.id, 3, &pool).await.unwrap_err();
    assert_eq!(err.info.as_deref(), Some("You cannot follow yourself"));

    let subscription = follow_user(cook.id, author.id, 3, &pool).await.unwrap();
    assert!(subscription.author.is_subscribed);
    assert_eq!(subscription.recipes_count, 0);

    let err = follow_user(cook.id, author.id, 3, &pool).await.unwrap_err();
    assert_eq!(err.code, 400);

    let err = follow_user(cook.id, author.id + 100, 3, &pool).await.unwrap_err();
    assert_eq!(err.code, 404);

    unfollow_user(cook.id, author.id, &pool).await.unwrap();
    assert_eq!(unfollow_user(cook.id, author.id, &pool).await.unwrap_err().code, 404);
}

fn media_context(pool: PgPool) -> (Context, PathBuf) {
    let media_root = std::env::temp_dir().join(format!("foodgram-store-{}", uuid::Uuid::new_v4()));
    let config = Config {
        database_url: String::new(),
        bind_address: ([127, 0, 0, 1], 8000).into(),
        jwt_secret: String::from("store-secret"),
        session_hours: 1,
        media_root: media_root.clone(),
        media_url: String::from("/media/"),
        max_connections: 1,
        limits: Limits::default(),
    };

    (Context::new(pool, config), media_root)
}

fn session(user: &User) -> SessionData {
    SessionData {
        user_id: user.id,
        username: user.username.clone(),
        role: UserRole::User,
    }
}

fn payload(ingredients: Vec<(Id, i32)>, tags: Vec<Id>, image: Option<&str>) -> RecipePayload {
    RecipePayload {
        ingredients: ingredients
            .into_iter()
            .map(|(id, amount)| IngredientAmountPayload { id, amount })
            .collect(),
        tags,
        image: image.map(str::to_owned),
        name: String::from("Toast"),
        text: String::from("Toast the bread."),
        cooking_time: 5,
    }
}

fn stored_images(media_root: &Path) -> usize {
    std::fs::read_dir(media_root.join("recipes"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

fn image_file(media_root: &Path, reference: &str) -> PathBuf {
    media_root
        .join("recipes")
        .join(reference.trim_start_matches("/media/recipes/"))
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn failed_create_leaves_no_image_behind(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let breakfast = tag(&pool, "breakfast", "#E26C2D").await;
    let (context, media_root) = media_context(pool.clone());

    let err = RecipeOperation::Create {
        payload: payload(vec![(9999, 1)], vec![breakfast.id], Some(PIXEL)),
    }
    .run(Some(&session(&cook)), &context)
    .await
    .unwrap_err();

    assert_eq!(err.code, 400);
    assert_eq!(recipe_count(&pool).await, 0);
    assert_eq!(stored_images(&media_root), 0);

    let _ = std::fs::remove_dir_all(media_root);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn replaced_and_deleted_images_are_removed(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let bread = ingredient(&pool, "bread", "slice").await;
    let breakfast = tag(&pool, "breakfast", "#E26C2D").await;
    let (context, media_root) = media_context(pool.clone());
    let session = session(&cook);

    let created = match (RecipeOperation::Create {
        payload: payload(vec![(bread.id, 2)], vec![breakfast.id], Some(PIXEL)),
    })
    .run(Some(&session), &context)
    .await
    .unwrap()
    {
        RecipeOutcome::Created(recipe) => recipe,
        other => panic!("unexpected outcome {other:?}"),
    };
    let first = image_file(&media_root, &created.image);
    assert!(first.exists());

    // resending the current reference keeps the file
    RecipeOperation::Update {
        id: created.id,
        payload: payload(vec![(bread.id, 3)], vec![breakfast.id], Some(&created.image)),
    }
    .run(Some(&session), &context)
    .await
    .unwrap();
    assert!(first.exists());

    // a failing update keeps the old image and drops the new upload
    RecipeOperation::Update {
        id: created.id,
        payload: payload(vec![(9999, 3)], vec![breakfast.id], Some(PIXEL)),
    }
    .run(Some(&session), &context)
    .await
    .unwrap_err();
    assert!(first.exists());
    assert_eq!(stored_images(&media_root), 1);

    let updated = match (RecipeOperation::Update {
        id: created.id,
        payload: payload(vec![(bread.id, 3)], vec![breakfast.id], Some(PIXEL)),
    })
    .run(Some(&session), &context)
    .await
    .unwrap()
    {
        RecipeOutcome::Updated(recipe) => recipe,
        other => panic!("unexpected outcome {other:?}"),
    };
    let second = image_file(&media_root, &updated.image);
    assert!(!first.exists());
    assert!(second.exists());

    RecipeOperation::Delete { id: created.id }
        .run(Some(&session), &context)
        .await
        .unwrap();
    assert!(!second.exists());
    assert_eq!(stored_images(&media_root), 0);

    let _ = std::fs::remove_dir_all(media_root);
}

#[sqlx::test]
#[ignore = "needs a PostgreSQL server"]
async fn foreign_image_reference_is_refused(pool: PgPool) {
    let cook = user(&pool, "cook").await;
    let bread = ingredient(&pool, "bread", "slice").await;
    let breakfast = tag(&pool, "breakfast", "#E26C2D").await;
    let (context, media_root) = media_context(pool.clone());

    let err = RecipeOperation::Create {
        payload: payload(
            vec![(bread.id, 1)],
            vec![breakfast.id],
            Some("/media/recipes/someone-else.png"),
        ),
    }
    .run(Some(&session(&cook)), &context)
    .await
    .unwrap_err();

    assert_eq!(err.field.as_deref(), Some("image"));
    assert_eq!(recipe_count(&pool).await, 0);

    let _ = std::fs::remove_dir_all(media_root);
}
