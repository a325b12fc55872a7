use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        addresses::{AddressInput, AddressList},
        auth::SessionUser,
    },
    error::{AppError, AppResult},
    models::Address,
    repositories::address_repository,
    response::{ApiResponse, Empty, Meta},
};

pub async fn list_addresses(
    pool: &DbPool,
    client: &SessionUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = address_repository::list_for_client(pool, client.user_id).await?;
    Ok(ApiResponse::success(
        "Addresses",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_address(
    pool: &DbPool,
    client: &SessionUser,
    payload: AddressInput,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let address = address_repository::insert(pool, client.user_id, &payload).await?;
    Ok(ApiResponse::success("Address saved", address, Some(Meta::empty())))
}

pub async fn delete_address(
    pool: &DbPool,
    client: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    if address_repository::find_for_client(pool, id, client.user_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    if !address_repository::delete_unused(pool, id, client.user_id).await? {
        return Err(AppError::Conflict(
            "Address is used by an order and cannot be deleted".into(),
        ));
    }
    Ok(ApiResponse::success("Address deleted", Empty::default(), Some(Meta::empty())))
}
