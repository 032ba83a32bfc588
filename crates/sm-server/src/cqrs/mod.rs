pub use mediator::DefaultAsyncMediator;

use crate::features::MutationContext;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(ctx: MutationContext) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Datasets
        .add_handler({
            let ctx = ctx.clone();
            move |cmd| {
                let ctx = ctx.clone();
                async move { crate::features::datasets::commands::submit::handle(ctx, cmd).await }
            }
        })
        .add_handler({
            let ctx = ctx.clone();
            move |cmd| {
                let ctx = ctx.clone();
                async move { crate::features::datasets::commands::update::handle(ctx, cmd).await }
            }
        })
        .add_handler({
            let ctx = ctx.clone();
            move |cmd| {
                let ctx = ctx.clone();
                async move { crate::features::datasets::commands::delete::handle(ctx, cmd).await }
            }
        })
        .add_handler({
            let ctx = ctx.clone();
            move |cmd| {
                let ctx = ctx.clone();
                async move {
                    crate::features::datasets::commands::add_optical_image::handle(ctx, cmd).await
                }
            }
        })
        .add_handler({
            let ctx = ctx.clone();
            move |cmd| {
                let ctx = ctx.clone();
                async move {
                    crate::features::datasets::commands::delete_optical_image::handle(ctx, cmd).await
                }
            }
        })
        .add_handler({
            let ctx = ctx.clone();
            move |query| {
                let ctx = ctx.clone();
                async move {
                    crate::features::datasets::queries::reprocessing_needed::handle(ctx, query).await
                }
            }
        })
        .build()
}
